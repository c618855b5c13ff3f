/// Longest channel name accepted, in characters.
pub const MAX_CHANNEL_NAME_LEN: usize = 64;

/// Symbols allowed besides ASCII letters and digits. `@` is not allowed.
const ALLOWED_SYMBOLS: &str = " !#$%&()+-:;<=>?[]^_`{|}~,";

/// Returns true when `channel_name` is 1 to 64 characters drawn from
/// `[a-zA-Z0-9 !#$%&()+\-:;<=>?\[\]^_`{|}~,]`.
pub fn is_valid_channel_name(channel_name: &str) -> bool {
    !channel_name.is_empty()
        && channel_name.chars().count() <= MAX_CHANNEL_NAME_LEN
        && channel_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ALLOWED_SYMBOLS.contains(c))
}
