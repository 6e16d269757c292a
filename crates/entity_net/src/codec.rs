//! MessagePack codec helpers.
//!
//! Thin wrappers around `rmp-serde`. Client messages and commands both travel
//! as MessagePack.

use serde::{Deserialize, Serialize};

use crate::error::NetError;

/// Encode a value to MessagePack bytes.
///
/// # Errors
///
/// Returns [`NetError::Encode`] if serialisation fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, NetError> {
    rmp_serde::to_vec(value).map_err(NetError::Encode)
}

/// Decode a value from MessagePack bytes.
///
/// # Errors
///
/// Returns [`NetError::Decode`] if deserialisation fails.
pub fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, NetError> {
    rmp_serde::from_slice(bytes).map_err(NetError::Decode)
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::messages::{ClientMessage, Colour, EntityKind, HideTextLabel, ShowTextLabel};

    #[test]
    fn test_show_message_survives_codec() {
        let msg = ClientMessage::ShowTextLabel(ShowTextLabel {
            kind: EntityKind::TextLabel,
            id: 17,
            colour: Colour::from_rgba(255, 0, 0, 255),
            position: Vec3::new(1.0, 2.0, 3.0),
            draw_distance: 50.0,
            test_los: true,
            attached_player: entity_pool::INVALID_PLAYER_ID,
            attached_vehicle: 3,
            text: "Shop".to_string(),
        });
        let bytes = encode(&msg).unwrap();
        let restored: ClientMessage = decode(&bytes).unwrap();
        assert_eq!(msg, restored);
    }

    #[test]
    fn test_hide_is_compact() {
        let msg = ClientMessage::HideTextLabel(HideTextLabel {
            kind: EntityKind::PlayerTextLabel,
            id: 2,
        });
        let bytes = encode(&msg).unwrap();
        assert!(bytes.len() < 32);
    }

    #[test]
    fn test_decode_invalid_bytes() {
        let result: Result<ClientMessage, _> = decode(&[0xFF, 0xFF]);
        assert!(result.is_err());
    }
}
