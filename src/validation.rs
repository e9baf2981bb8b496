//! Argument violations for tool calls.
//!
//! Every violation found while checking a `tools/call` arguments object is
//! collected instead of stopping at the first. [`ValidationErrors`] renders
//! them as `path: reason` pairs joined with `", "`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub path: String,
    pub reason: String,
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn push(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.violations.push(FieldViolation {
            path: path.into(),
            reason: reason.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violations_join_in_order() {
        let mut errors = ValidationErrors::default();
        assert!(errors.is_empty());

        errors.push("query", "Required");
        errors.push("bbox[0]", "200 is greater than the maximum of 180");

        assert_eq!(
            errors.to_string(),
            "query: Required, bbox[0]: 200 is greater than the maximum of 180"
        );
        assert_eq!(errors.violations()[1].path, "bbox[0]");
    }
}
