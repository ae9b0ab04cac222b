use crate::config::types::{ReviewError, Result};
use crate::judge::adapter::LanguageAdapter;
use crate::judge::languages::python::PythonAdapter;

pub fn adapter_for(language: &str) -> Result<Box<dyn LanguageAdapter>> {
    match language {
        "python" | "py" | "python3" => Ok(Box::new(PythonAdapter)),
        _ => Err(ReviewError::Config(format!(
            "unsupported language adapter: {language}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_aliases() {
        for name in ["python", "py", "python3"] {
            assert_eq!(adapter_for(name).unwrap().language(), "python");
        }
    }

    #[test]
    fn test_unknown_language() {
        let err = adapter_for("cobol").err().unwrap();
        assert!(err.to_string().contains("unsupported language adapter: cobol"));
    }
}
