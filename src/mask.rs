//! Masking of secrets before display.

use crate::profile::Profile;

/// Character replacing the hidden middle of a secret
pub const MASK_CHAR: char = '*';

/// Visible prefix/suffix lengths used by `list`
pub const LIST_PREFIX: usize = 8;
pub const LIST_SUFFIX: usize = 5;

/// Visible prefix/suffix lengths used in log lines
pub const LOG_PREFIX: usize = 5;
pub const LOG_SUFFIX: usize = 5;

/// Keep `prefix` leading and `suffix` trailing characters, replacing the rest
/// with [`MASK_CHAR`].
///
/// A value too short to hide anything is masked entirely.
pub fn mask(value: &str, prefix: usize, suffix: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= prefix + suffix {
        return MASK_CHAR.to_string().repeat(chars.len());
    }

    let hidden = chars.len() - prefix - suffix;
    let mut out = String::with_capacity(value.len());
    out.extend(&chars[..prefix]);
    out.extend(std::iter::repeat_n(MASK_CHAR, hidden));
    out.extend(&chars[chars.len() - suffix..]);
    out
}

/// Key as shown by `list` and `current`
pub fn mask_key(key: &str) -> String {
    mask(key, LIST_PREFIX, LIST_SUFFIX)
}

/// Copy of `profile` with both keys masked
pub fn masked_profile(profile: &Profile) -> Profile {
    Profile {
        public_key: mask_key(&profile.public_key),
        private_key: mask_key(&profile.private_key),
        ..profile.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_keeps_prefix_and_suffix() {
        assert_eq!(mask("abcdefghijklmnop", 8, 5), "abcdefgh***lmnop");
        assert_eq!(mask("0123456789", 2, 3), "01*****789");
    }

    #[test]
    fn test_mask_short_values_fully() {
        assert_eq!(mask("short", 8, 5), "*****");
        assert_eq!(mask("abcdefghijklm", 8, 5), "*************");
        assert_eq!(mask("", 8, 5), "");
    }

    #[test]
    fn test_mask_multibyte() {
        assert_eq!(mask("ééééé", 1, 1), "é***é");
    }

    #[test]
    fn test_masked_profile_hides_middle_of_keys() {
        let mut profile = Profile::new("a");
        profile.public_key = "public-key-0123456789".to_string();
        profile.private_key = "short".to_string();

        let shown = masked_profile(&profile);
        assert_eq!(shown.public_key, "public-k********56789");
        assert_eq!(shown.private_key, "*****");
        assert_eq!(shown.name, "a");
        assert_eq!(profile.private_key, "short");
    }
}
