mod implement;

use proc_macro::TokenStream;

/// Spread an inherent implementation across free functions in any file of
/// the crate. The attribute wraps the item in `impl <Path> { .. }`.
#[proc_macro_attribute]
pub fn implement(args: TokenStream, input: TokenStream) -> TokenStream {
	implement::implement(args, input)
}
