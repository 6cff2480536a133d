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

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, ItemFn, ReturnType};

/// Runs an `async fn` test on a multi-threaded runtime and fails it on any panic.
#[proc_macro_attribute]
pub fn courier_test(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let body = &input.block;
    let name = &sig.ident;
    let output = &sig.output;

    if sig.asyncness.is_none() {
        return syn::Error::new_spanned(sig.fn_token, "courier_test functions must be async")
            .to_compile_error()
            .into();
    }
    if !sig.inputs.is_empty() {
        return syn::Error::new_spanned(&sig.inputs, "courier_test functions take no arguments")
            .to_compile_error()
            .into();
    }

    let finish = match output {
        ReturnType::Default => quote!(result),
        ReturnType::Type(..) => quote!(result.unwrap()),
    };

    let inner = syn::Ident::new(&format!("__{name}_body"), name.span());

    let expanded = quote! {
        #[test]
        #(#attrs)*
        #vis fn #name() {
            use ::courier_test::__private::{parking_lot, tokio, tracing};
            use ::std::sync::Arc;

            let first_panic: Arc<parking_lot::Mutex<Option<String>>> = Arc::default();
            let recorder = Arc::clone(&first_panic);
            let previous_hook = ::std::panic::take_hook();
            ::std::panic::set_hook(Box::new(move |info| {
                let message = info
                    .payload()
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| info.payload().downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "no panic message".to_string());
                let location = info
                    .location()
                    .map_or_else(|| "unknown location".to_string(), |l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
                let summary = format!("{location}: {}", message.trim().replace('\n', " "));
                tracing::error!("Panic at {}", summary);
                recorder.lock().get_or_insert(summary);
                previous_hook(info);
            }));

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("failed to build the test runtime");

            let result = runtime.block_on(async {
                let span = tracing::info_span!("courier_test", name = stringify!(#name));
                let _entered = span.enter();
                #inner().await
            });
            drop(runtime);

            if let Some(summary) = first_panic.lock().take() {
                panic!("Panic at {}", summary);
            }

            #finish
        }

        async fn #inner() #output #body
    };

    expanded.into()
}
