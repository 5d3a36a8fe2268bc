use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemFn, Path, parse_macro_input};

pub(super) fn implement(args: TokenStream, input: TokenStream) -> TokenStream {
	let receiver = parse_macro_input!(args as Path);
	let item = parse_macro_input!(input as ItemFn);

	let ret = quote! {
		impl #receiver {
			#item
		}
	};

	ret.into()
}
