//! NATS subject hierarchy.
//!
//! All subjects are prefixed with `streamer.` to namespace within a shared
//! NATS cluster.

/// Root prefix for all subjects.
pub const PREFIX: &str = "streamer";

/// Commands from the scripting host. Host → Server (request/reply).
pub const COMMAND: &str = "streamer.command";

/// Queue group shared by server instances consuming commands.
pub const COMMAND_QUEUE: &str = "q.streamer";

/// Build the subject carrying client messages for one player.
///
/// `streamer.client.<player_id>`
#[must_use]
pub fn client(player: entity_pool::PlayerId) -> String {
    format!("{PREFIX}.client.{}", player.raw())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_subject() {
        assert_eq!(client(entity_pool::PlayerId(42)), "streamer.client.42");
    }
}
