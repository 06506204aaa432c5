//! Record derive macro implementation

use crate::attrs::field_attr;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let struct_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record can only be derived for structs",
            ));
        }
    };

    let mut defs = Vec::with_capacity(fields.len());
    let mut get_arms = Vec::new();
    let mut set_arms = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let field_name = ident.to_string();
        let attr = field_attr(field)?;

        let column = &attr.column;
        let col = &attr.col;
        let db = &attr.db;
        let form = &attr.form;
        let sqlite = &attr.sqlite;
        let sqlite3 = &attr.sqlite3;
        let mysql = &attr.mysql;
        let postgres = &attr.postgres;
        let postgre = &attr.postgre;
        defs.push(quote! {
            dbmap::FieldDef {
                column: #column,
                col: #col,
                db: #db,
                form: #form,
                sqlite: #sqlite,
                sqlite3: #sqlite3,
                mysql: #mysql,
                postgres: #postgres,
                postgre: #postgre,
                ..dbmap::FieldDef::new(#index, #field_name)
            }
        });

        // Only persisted fields need value conversions.
        if let Some(column_name) = attr.column_name() {
            get_arms.push(quote! {
                #index => ::std::result::Result::Ok(dbmap::ToValue::to_value(&self.#ident))
            });
            set_arms.push(quote! {
                #index => {
                    self.#ident = dbmap::FromValue::from_value(value)
                        .map_err(|e| dbmap::OrmError::decode(#column_name, e))?;
                    ::std::result::Result::Ok(())
                }
            });
        }
    }

    Ok(quote! {
        impl #impl_generics dbmap::FieldSet for #name #ty_generics #where_clause {
            fn get_field(&self, index: usize) -> dbmap::OrmResult<dbmap::Value> {
                match index {
                    #(#get_arms,)*
                    _ => ::std::result::Result::Err(dbmap::OrmError::Other(format!(
                        "{} has no persisted field at index {}",
                        #struct_name,
                        index
                    ))),
                }
            }

            #[allow(unused_variables)]
            fn set_field(&mut self, index: usize, value: dbmap::Value) -> dbmap::OrmResult<()> {
                match index {
                    #(#set_arms)*
                    _ => ::std::result::Result::Err(dbmap::OrmError::Other(format!(
                        "{} has no persisted field at index {}",
                        #struct_name,
                        index
                    ))),
                }
            }
        }

        impl #impl_generics dbmap::Record for #name #ty_generics #where_clause {
            fn fields() -> ::std::vec::Vec<dbmap::FieldDef> {
                ::std::vec![#(#defs),*]
            }
        }
    })
}
