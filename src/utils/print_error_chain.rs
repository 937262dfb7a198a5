use std::fmt::{self, Display};

/// Печатает ошибку вместе со всей цепочкой причин через `": "`.
pub struct PrintErrorChain<'a>(pub &'a dyn std::error::Error);

impl Display for PrintErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self.0, f)?;

        let mut source = self.0.source();
        while let Some(error) = source {
            write!(f, ": {error}")?;
            source = error.source();
        }

        Ok(())
    }
}
