use std::fmt::Display;

#[derive(Debug)]
pub struct InjectorError {
    pub who: Option<String>,
    pub error: String,
}

impl InjectorError {
    pub fn from_string(error: String) -> Self {
        InjectorError { error, who: None }
    }

    pub fn from_error<E: Display>(prefix: &str) -> impl Fn(E) -> Self + '_ {
        move |e: E| InjectorError::from_string(format!("{}: {}", prefix, e))
    }

    pub fn with_pod(self, who: String) -> Self {
        InjectorError {
            error: self.error,
            who: Some(who),
        }
    }
}

impl Display for InjectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.who {
            Some(who) => write!(f, "Injector [{}] error: {}", who, self.error),
            None => write!(f, "Injector error: {}", self.error),
        }
    }
}

impl std::error::Error for InjectorError {}

impl From<&str> for InjectorError {
    fn from(error: &str) -> Self {
        InjectorError::from_string(error.to_string())
    }
}

impl From<String> for InjectorError {
    fn from(error: String) -> Self {
        InjectorError::from_string(error)
    }
}
