//! Field-level `#[orm(...)]` attribute parsing.

use syn::{LitStr, Result};

/// Annotation values of one field; empty strings mean "not given".
#[derive(Default)]
pub(crate) struct FieldAttr {
    pub column: String,
    pub col: String,
    pub db: String,
    pub form: String,
    pub sqlite: String,
    pub sqlite3: String,
    pub mysql: String,
    pub postgres: String,
    pub postgre: String,
}

impl FieldAttr {
    /// Column name by priority: `column`, then `col`, then `db`.
    pub fn column_name(&self) -> Option<&str> {
        [&self.column, &self.col, &self.db]
            .into_iter()
            .find(|name| !name.is_empty())
            .map(String::as_str)
    }

    fn slot(&mut self, key: &syn::Ident) -> Result<&mut String> {
        Ok(match key.to_string().as_str() {
            "column" => &mut self.column,
            "col" => &mut self.col,
            "db" => &mut self.db,
            "form" => &mut self.form,
            "sqlite" => &mut self.sqlite,
            "sqlite3" => &mut self.sqlite3,
            "mysql" => &mut self.mysql,
            "postgres" => &mut self.postgres,
            "postgre" => &mut self.postgre,
            other => {
                return Err(syn::Error::new(
                    key.span(),
                    format!("unknown orm attribute `{other}`"),
                ));
            }
        })
    }
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        // comma-separated key = "value" pairs
        while !input.is_empty() {
            let key: syn::Ident = input.parse()?;
            let _: syn::Token![=] = input.parse()?;
            let value: LitStr = input.parse()?;
            *attr.slot(&key)? = value.value();

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        if !input.is_empty() {
            return Err(input.error("expected `key = \"value\"` pairs"));
        }
        Ok(attr)
    }
}

/// Merge every `#[orm(...)]` on `field`; later attributes override earlier keys.
pub(crate) fn field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut merged = FieldAttr::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let parsed: FieldAttr = attr.parse_args()?;
        for (dst, src) in [
            (&mut merged.column, parsed.column),
            (&mut merged.col, parsed.col),
            (&mut merged.db, parsed.db),
            (&mut merged.form, parsed.form),
            (&mut merged.sqlite, parsed.sqlite),
            (&mut merged.sqlite3, parsed.sqlite3),
            (&mut merged.mysql, parsed.mysql),
            (&mut merged.postgres, parsed.postgres),
            (&mut merged.postgre, parsed.postgre),
        ] {
            if !src.is_empty() {
                *dst = src;
            }
        }
    }
    Ok(merged)
}
