// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFormField {
    Src,
    Dst,
}

impl QueryFormField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Src => "src",
            Self::Dst => "dst",
        }
    }

    pub const fn next(self) -> Self {
        match self {
            Self::Src => Self::Dst,
            Self::Dst => Self::Src,
        }
    }
}

/// Raw text of the run-query form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFormInput {
    pub src: String,
    pub dst: String,
}

impl QueryFormInput {
    pub fn field_mut(&mut self, field: QueryFormField) -> &mut String {
        match field {
            QueryFormField::Src => &mut self.src,
            QueryFormField::Dst => &mut self.dst,
        }
    }

    pub fn field(&self, field: QueryFormField) -> &str {
        match field {
            QueryFormField::Src => &self.src,
            QueryFormField::Dst => &self.dst,
        }
    }

    /// Trimmed filters, with blank fields mapped to `None`.
    pub fn filters(&self) -> (Option<&str>, Option<&str>) {
        (non_blank(&self.src), non_blank(&self.dst))
    }

    pub fn validate(&self) -> Result<()> {
        if self.filters() == (None, None) {
            bail!("at least one of src or dst is required");
        }
        Ok(())
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::{QueryFormField, QueryFormInput};

    #[test]
    fn blank_form_is_rejected() {
        let form = QueryFormInput {
            src: "   ".to_owned(),
            dst: String::new(),
        };
        let error = form.validate().expect_err("blank form should fail");
        assert!(error.to_string().contains("src or dst"));
    }

    #[test]
    fn filters_are_trimmed_and_blanks_dropped() {
        let form = QueryFormInput {
            src: "  HR_Q90 ".to_owned(),
            dst: " ".to_owned(),
        };
        assert!(form.validate().is_ok());
        assert_eq!(form.filters(), (Some("HR_Q90"), None));
    }

    #[test]
    fn field_cursor_cycles() {
        let mut form = QueryFormInput::default();
        let field = QueryFormField::Src.next();
        assert_eq!(field, QueryFormField::Dst);
        form.field_mut(field).push_str("SPO2_Q10");
        assert_eq!(form.field(QueryFormField::Dst), "SPO2_Q10");
        assert_eq!(field.next(), QueryFormField::Src);
    }
}
