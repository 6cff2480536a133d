/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
#![forbid(unsafe_code)]

//! Courier Macro
//!
//! Procedural macros for the Courier actor runtime.
//!
//! # Message Macro
//!
//! [`courier_message`] prepares a type for use as an actor's `Message`, or as an
//! event on the event bus:
//!
//! ```ignore
//! #[courier_message]
//! pub enum AccountMessage {
//!     Deposit(u64),
//!     Balance,
//! }
//! ```

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Whether `input` already derives `trait_name`.
fn derives(input: &DeriveInput, trait_name: &str) -> bool {
    input
        .attrs
        .iter()
        .filter(|attr| attr.path().is_ident("derive"))
        .any(|attr| {
            let mut found = false;
            let _ = attr.parse_nested_meta(|meta| {
                found |= meta.path.is_ident(trait_name);
                Ok(())
            });
            found
        })
}

/// Derives what a Courier message needs.
///
/// Adds `#[derive(Clone, Debug)]` for whichever of the two is missing and a
/// compile-time check that the type is `Send + 'static`, which the runtime
/// requires to move messages between tasks. `Debug` is what lets dead letters
/// and traces show the payload; `Clone` is what repeating schedules and event
/// forwarding copy.
///
/// ```ignore
/// #[courier_message]
/// pub struct Tick;
///
/// #[courier_message]
/// #[derive(PartialEq)]
/// pub enum Command {
///     Start { id: u32 },
///     Stop,
/// }
/// ```
///
/// Messages that hold non-`Clone` values, such as channels, should implement
/// `Debug` by hand instead of using this attribute.
#[proc_macro_attribute]
pub fn courier_message(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut missing = Vec::new();
    if !derives(&input, "Clone") {
        missing.push(quote!(Clone));
    }
    if !derives(&input, "Debug") {
        missing.push(quote!(Debug));
    }
    let derive_attr = if missing.is_empty() {
        quote!()
    } else {
        quote!(#[derive(#(#missing),*)])
    };

    let check = quote::format_ident!("_courier_message_bounds_{}", name);

    let expanded = quote! {
        #derive_attr
        #input

        #[doc(hidden)]
        #[allow(dead_code, non_snake_case, clippy::needless_lifetimes)]
        const _: () = {
            fn #check #impl_generics () #where_clause {
                fn requires_send<T: Send + 'static>() {}
                requires_send::<#name #ty_generics>();
            }
        };
    };

    TokenStream::from(expanded)
}
