/// Builders for test pods.
///
/// The expansions refer to `Pod`, `Container`, `Volume`, `VolumeMount` and
/// `BTreeMap` unqualified, so the calling test module imports them.

#[macro_export]
macro_rules! set_pod_field {
    ($pod:expr, containers => $cs:expr) => {
        let test_cs: Vec<Container> = $cs
            .iter()
            .map(|x| {
                let mut c: Container = Default::default();
                c.name = x.to_string();
                c
            })
            .collect();
        if let Some(spec) = $pod.spec.as_mut() {
            spec.containers = test_cs;
        }
    };
    ($pod:expr, mounts => $ms:expr) => {
        let test_ms: Vec<VolumeMount> = $ms
            .iter()
            .map(|(name, path)| {
                let mut m: VolumeMount = Default::default();
                m.name = name.to_string();
                m.mount_path = path.to_string();
                m
            })
            .collect();
        if let Some(spec) = $pod.spec.as_mut() {
            for c in spec.containers.iter_mut() {
                c.volume_mounts = Some(test_ms.clone());
            }
        }
    };
    ($pod:expr, volumes => $vs:expr) => {
        let test_vs: Vec<Volume> = $vs
            .iter()
            .map(|x| {
                let mut v: Volume = Default::default();
                v.name = x.to_string();
                v
            })
            .collect();
        if let Some(spec) = $pod.spec.as_mut() {
            spec.volumes = Some(test_vs);
        }
    };
    ($pod:expr, annotations => $annotations:expr) => {
        let mut bm = BTreeMap::new();
        for (k, v) in $annotations {
            bm.insert(k.to_string(), v.to_string());
        }
        $pod.metadata.annotations = Some(bm);
    };
}

/// `pod!(n)` builds pod `srv<n>` in namespace `ns<n>` with an empty spec.
/// Fields are set with `pod!(n, containers => .., annotations => ..)`.
#[macro_export]
macro_rules! pod {
    ($n:tt) => {{
        let mut pod: Pod = Default::default();
        pod.metadata.name = Some(format!("srv{}", $n));
        pod.metadata.namespace = Some(format!("ns{}", $n));
        pod.spec = Some(Default::default());
        pod
    }};
    ($n:tt, $($f:ident => $e:expr),+) => {{
        let mut pod = pod!($n);
        $(
            set_pod_field!(pod, $f => $e);
        )+
        pod
    }};
}
