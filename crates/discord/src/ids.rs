//! Snowflake parsing. serenity's id constructors panic on zero, so every
//! string id coming from config or the engine goes through here.

use {
    helpdesk_platform::{Error, Result},
    serenity::all::{ChannelId, GuildId, MessageId, RoleId, UserId},
};

fn snowflake(raw: &str, kind: &'static str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|n| *n != 0)
        .ok_or_else(|| Error::malformed_id(kind, raw))
}

pub fn channel(raw: &str) -> Result<ChannelId> {
    snowflake(raw, "channel").map(ChannelId::new)
}

pub fn message(raw: &str) -> Result<MessageId> {
    snowflake(raw, "message").map(MessageId::new)
}

pub fn user(raw: &str) -> Result<UserId> {
    snowflake(raw, "user").map(UserId::new)
}

pub fn guild(raw: &str) -> Result<GuildId> {
    snowflake(raw, "guild").map(GuildId::new)
}

pub fn role(raw: &str) -> Result<RoleId> {
    snowflake(raw, "role").map(RoleId::new)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("0")]
    #[case("")]
    #[case("abc")]
    #[case("-5")]
    #[case("<#123>")]
    fn rejects(#[case] raw: &str) {
        assert!(channel(raw).is_err());
    }

    #[test]
    fn accepts_plain_snowflakes() {
        assert_eq!(channel(" 1234 ").unwrap(), ChannelId::new(1234));
        assert_eq!(user("42").unwrap().get(), 42);
    }
}
