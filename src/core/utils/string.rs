use unicode_normalization::{UnicodeNormalization, is_nfc};

/// Normalize a display name into the NFC form used to key the name index.
#[must_use]
pub fn normalize_nfc(s: &str) -> String {
	if is_nfc(s) {
		s.to_owned()
	} else {
		s.nfc().collect()
	}
}
