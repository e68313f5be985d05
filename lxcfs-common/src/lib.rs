pub mod annotations;
pub mod config;
pub mod constants;
pub mod errors;
pub mod sidecar;
pub mod traits;

/// Escapes an annotation key so it addresses one member of
/// `/metadata/annotations` in a JSON pointer.
#[macro_export]
macro_rules! patch_annotation {
    ($annotation:expr) => {
        $annotation.replace("~", "~0").replace("/", "~1")
    };
}
