use crate::decode_model::ModelMetadata;
use dray_core::Value;
use proc_macro2::TokenStream;
use quote::quote;

pub(crate) fn model_trait(model: &ModelMetadata) -> TokenStream {
    let name = &model.item.ident;
    let table = &model.table;
    let identity = &model.identity().ident;
    let field_defs = model.fields.iter().map(|f| {
        let column = &f.name;
        let ty = &f.ty;
        let value = if f.value == Value::Null {
            quote!(<#ty as ::dray::AsValue>::as_empty_value())
        } else {
            let value = &f.value;
            quote!(#value)
        };
        let nullable = f.nullable;
        let is_identity = f.identity;
        quote! {
            ::dray::FieldDef {
                name: #column,
                value: #value,
                nullable: #nullable,
                identity: #is_identity,
            }
        }
    });
    let get_arms = model.fields.iter().map(|f| {
        let column = &f.name;
        let ident = &f.ident;
        quote! {
            #column => Some(::dray::AsValue::as_value(::std::clone::Clone::clone(&self.#ident)))
        }
    });
    let write_arms = model.fields.iter().map(|f| {
        let column = &f.name;
        let ident = &f.ident;
        let ty = &f.ty;
        quote! {
            #column => self.#ident = <#ty as ::dray::AsValue>::try_from_value(value)?
        }
    });
    quote! {
        impl ::dray::Model for #name {
            fn table_name() -> &'static str {
                #table
            }

            fn fields() -> &'static [::dray::FieldDef] {
                static FIELDS: ::std::sync::LazyLock<Box<[::dray::FieldDef]>> =
                    ::std::sync::LazyLock::new(|| vec![#(#field_defs),*].into_boxed_slice());
                &FIELDS
            }

            fn id(&self) -> i64 {
                self.#identity
            }

            fn assign_identity(&mut self, id: i64) {
                self.#identity = id;
            }

            fn get_field(&self, name: &str) -> Option<::dray::Value> {
                match name {
                    #(#get_arms,)*
                    _ => None,
                }
            }

            fn write_field(&mut self, name: &str, value: ::dray::Value) -> ::dray::Result<bool> {
                match name {
                    #(#write_arms,)*
                    _ => return Ok(false),
                }
                Ok(true)
            }
        }
    }
}
