use std::sync::LazyLock;

use regex::Regex;

// RFC 1459 nickname: a letter or special to start, letters/digits/specials
// after that. Kept deliberately short of the full grammar's comma rules
// because commas never survive parameter splitting anyway.
static NICKNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z\[\]\\{}|^_-][A-Za-z0-9\[\]\\{}|^_-]{0,29}$")
        .expect("nickname pattern is valid")
});

// `#` plus at least one character, no spaces, commas or control bytes.
static CHANNEL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#[^ ,\x00-\x1f\x7f]{1,49}$").expect("channel name pattern is valid")
});

pub fn is_valid_nickname(nickname: &str) -> bool {
    NICKNAME.is_match(nickname)
}

pub fn is_valid_channel_name(name: &str) -> bool {
    CHANNEL_NAME.is_match(name)
}

#[test]
fn nickname_plainword_isvalid() {
    assert!(is_valid_nickname("carol"));
    assert!(is_valid_nickname("c4rol"));
    assert!(is_valid_nickname("[away]_bob"));
}

#[test]
fn nickname_leadingdigit_isinvalid() {
    assert!(!is_valid_nickname("4carol"));
}

#[test]
fn nickname_empty_isinvalid() {
    assert!(!is_valid_nickname(""));
}

#[test]
fn nickname_overlong_isinvalid() {
    assert!(is_valid_nickname(&"a".repeat(30)));
    assert!(!is_valid_nickname(&"a".repeat(31)));
}

#[test]
fn nickname_embeddedspace_isinvalid() {
    assert!(!is_valid_nickname("ca rol"));
}

#[test]
fn channelname_hashprefixed_isvalid() {
    assert!(is_valid_channel_name("#general"));
    assert!(is_valid_channel_name("#42"));
}

#[test]
fn channelname_barehash_isinvalid() {
    assert!(!is_valid_channel_name("#"));
}

#[test]
fn channelname_nohash_isinvalid() {
    assert!(!is_valid_channel_name("general"));
}

#[test]
fn channelname_comma_isinvalid() {
    assert!(!is_valid_channel_name("#a,b"));
}

#[test]
fn channelname_controlbyte_isinvalid() {
    assert!(!is_valid_channel_name("#a\x07b"));
}

#[test]
fn channelname_overlong_isinvalid() {
    assert!(is_valid_channel_name(&format!("#{}", "a".repeat(49))));
    assert!(!is_valid_channel_name(&format!("#{}", "a".repeat(50))));
}
