extern crate proc_macro;

use proc_macro::TokenStream;

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DataStruct, DeriveInput, Fields, Index};

/// Derives `OrbWrite` by writing each field in declaration order.
/// Records in the container are tightly packed, so no padding is inserted between fields.
#[proc_macro_derive(OrbWrite)]
pub fn orb_write_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let field_accessors = match &input.data {
        Data::Struct(DataStruct { fields, .. }) => field_accessors(fields),
        _ => panic!("expected a struct"),
    };

    let expanded = quote! {
        impl #impl_generics ::orb_write::OrbWrite for #name #ty_generics #where_clause {
            fn orb_write<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
                #(
                    ::orb_write::OrbWrite::orb_write(&self.#field_accessors, writer)?;
                )*
                Ok(())
            }

            fn size_in_bytes(&self) -> u64 {
                let mut size = 0;
                #(
                    size += ::orb_write::OrbWrite::size_in_bytes(&self.#field_accessors);
                )*
                size
            }
        }
    };

    TokenStream::from(expanded)
}

fn field_accessors(fields: &Fields) -> Vec<TokenStream2> {
    match fields {
        Fields::Named(fields) => fields
            .named
            .iter()
            .map(|field| {
                let ident = &field.ident;
                quote!(#ident)
            })
            .collect(),
        Fields::Unnamed(fields) => (0..fields.unnamed.len())
            .map(|i| {
                let index = Index::from(i);
                quote!(#index)
            })
            .collect(),
        Fields::Unit => Vec::new(),
    }
}
