// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Closed message sets and the id-driven parser.
//!
//! A [`MessageSet`] is either a single catalog message or an enum over several, declared with
//! [`message_set!`](crate::message_set). Each member claims exactly one [`MessageId`], so the
//! first match is the only match.

use core::marker::PhantomData;

use super::ids::MessageId;
use super::Error;

/// A statically known set of messages that can be parsed by id.
pub trait MessageSet: Sized {
    /// Whether some member of the set is tagged `id`.
    fn accepts(id: MessageId) -> bool;

    /// Parse `payload` as the member tagged `id`. `None` if no member claims the id or the
    /// payload is malformed.
    fn parse(id: MessageId, payload: &[u8]) -> Option<Self>;

    fn message_id(&self) -> MessageId;

    /// Encode the contained message, returning the byte count.
    fn serialize(&self, buf: &mut [u8]) -> Result<usize, Error>;
}

/// Outcome of a parse: `None` is "no match".
pub type ParseResult<S> = Option<S>;

/// Parser bound to one message set.
pub struct Parser<S> {
    _set: PhantomData<fn() -> S>,
}

impl<S: MessageSet> Parser<S> {
    pub const fn new() -> Self {
        Self { _set: PhantomData }
    }

    #[inline]
    pub fn accepts(&self, id: MessageId) -> bool {
        S::accepts(id)
    }

    #[inline]
    pub fn parse(&self, id: MessageId, payload: &[u8]) -> ParseResult<S> {
        S::parse(id, payload)
    }
}

impl<S: MessageSet> Default for Parser<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Declare an enum over catalog messages and implement [`MessageSet`] for it.
///
/// ```ignore
/// message_set! {
///     pub enum SystemMessage {
///         HeartbeatRequest,
///         DeviceInfoRequest,
///     }
/// }
/// ```
///
/// Each variant wraps the message type of the same name, which must be in scope.
#[macro_export]
macro_rules! message_set {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $variant:ident ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        $vis enum $name {
            $( $variant($variant), )*
        }

        impl $crate::can::parser::MessageSet for $name {
            fn accepts(id: $crate::can::MessageId) -> bool {
                false $( || id == <$variant as $crate::can::Message>::ID )*
            }

            fn parse(id: $crate::can::MessageId, payload: &[u8]) -> Option<Self> {
                $(
                    if id == <$variant as $crate::can::Message>::ID {
                        return <$variant as $crate::can::Message>::parse(payload)
                            .ok()
                            .map($name::$variant);
                    }
                )*
                None
            }

            fn message_id(&self) -> $crate::can::MessageId {
                match self {
                    $( $name::$variant(_) => <$variant as $crate::can::Message>::ID, )*
                }
            }

            fn serialize(&self, buf: &mut [u8]) -> Result<usize, $crate::can::Error> {
                match self {
                    $( $name::$variant(m) => <$variant as $crate::can::Message>::serialize(m, buf), )*
                }
            }
        }

        $(
            impl From<$variant> for $name {
                #[inline]
                fn from(m: $variant) -> Self {
                    $name::$variant(m)
                }
            }
        )*
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::can::messages::*;

    message_set! {
        enum MoveCommands {
            AddLinearMoveRequest,
            ExecuteMoveGroupRequest,
            StopRequest,
        }
    }

    #[test]
    fn single_type_parser() {
        let parser = Parser::<HeartbeatRequest>::new();
        assert_eq!(
            parser.parse(MessageId::HeartbeatRequest, &[]),
            Some(HeartbeatRequest {})
        );
        assert_eq!(parser.parse(MessageId::HeartbeatResponse, &[]), None);
    }

    #[test]
    fn set_parser_picks_matching_member() {
        let parser = Parser::<MoveCommands>::new();
        assert!(parser.accepts(MessageId::StopRequest));
        assert!(!parser.accepts(MessageId::HeartbeatRequest));

        let parsed = parser.parse(MessageId::ExecuteMoveGroupRequest, &[2, 0, 0]);
        assert_eq!(
            parsed,
            Some(MoveCommands::ExecuteMoveGroupRequest(ExecuteMoveGroupRequest {
                group_id: 2,
                start_trigger: 0,
                cancel_trigger: 0,
            }))
        );
        assert_eq!(
            parsed.map(|m| m.message_id()),
            Some(MessageId::ExecuteMoveGroupRequest)
        );
    }

    #[test]
    fn malformed_payload_is_no_match() {
        let parser = Parser::<MoveCommands>::new();
        assert_eq!(parser.parse(MessageId::AddLinearMoveRequest, &[0, 1, 2]), None);
        assert_eq!(parser.parse(MessageId::GetMoveGroupRequest, &[0]), None);
    }

    #[test]
    fn set_serializes_inner_message() {
        let m = MoveCommands::from(ExecuteMoveGroupRequest {
            group_id: 1,
            start_trigger: 2,
            cancel_trigger: 3,
        });
        let mut buf = [0u8; 8];
        assert_eq!(MessageSet::serialize(&m, &mut buf), Ok(3));
        assert_eq!(&buf[..3], &[1, 2, 3]);
    }
}
