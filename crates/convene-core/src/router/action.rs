//! Typed parsing of colon-delimited callback payloads.
//!
//! Inbound interactive events carry payloads of the shape
//! `action:param1:param2`. Parsing is total: wrong arity, unknown actions,
//! and non-numeric ids all come back as `CallbackError`, which the router
//! turns into a safe user-facing reply.

use std::str::FromStr;

use convene_types::error::CallbackError;

/// A recognized callback action with its validated parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Vote { meeting_id: i64, slot_id: i64 },
    Unvote { meeting_id: i64, slot_id: i64 },
    ShowResults { meeting_id: i64 },
    CloseVoting { meeting_id: i64 },
    CreateMeeting,
    MyMeetings,
    Help,
    Cancel,
    SkipDescription,
}

fn parse_id(raw: &str) -> Result<i64, CallbackError> {
    raw.parse::<i64>()
        .map_err(|_| CallbackError::InvalidId(raw.to_string()))
}

fn expect_arity(action: &str, params: &[&str], expected: usize) -> Result<(), CallbackError> {
    if params.len() != expected {
        return Err(CallbackError::WrongArity {
            action: action.to_string(),
            expected,
            got: params.len(),
        });
    }
    Ok(())
}

impl FromStr for CallbackAction {
    type Err = CallbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let action = parts.next().filter(|a| !a.is_empty()).ok_or(CallbackError::Empty)?;
        let params: Vec<&str> = parts.collect();

        match action {
            "vote" => {
                expect_arity(action, &params, 2)?;
                Ok(CallbackAction::Vote {
                    meeting_id: parse_id(params[0])?,
                    slot_id: parse_id(params[1])?,
                })
            }
            "unvote" => {
                expect_arity(action, &params, 2)?;
                Ok(CallbackAction::Unvote {
                    meeting_id: parse_id(params[0])?,
                    slot_id: parse_id(params[1])?,
                })
            }
            "show_results" => {
                expect_arity(action, &params, 1)?;
                Ok(CallbackAction::ShowResults {
                    meeting_id: parse_id(params[0])?,
                })
            }
            "close_voting" => {
                expect_arity(action, &params, 1)?;
                Ok(CallbackAction::CloseVoting {
                    meeting_id: parse_id(params[0])?,
                })
            }
            "create_meeting" => {
                expect_arity(action, &params, 0)?;
                Ok(CallbackAction::CreateMeeting)
            }
            "my_meetings" => {
                expect_arity(action, &params, 0)?;
                Ok(CallbackAction::MyMeetings)
            }
            "help" => {
                expect_arity(action, &params, 0)?;
                Ok(CallbackAction::Help)
            }
            "cancel" => {
                expect_arity(action, &params, 0)?;
                Ok(CallbackAction::Cancel)
            }
            "skip_description" => {
                expect_arity(action, &params, 0)?;
                Ok(CallbackAction::SkipDescription)
            }
            other => Err(CallbackError::UnknownAction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_vote_with_ids() {
        let action: CallbackAction = "vote:3:7".parse().unwrap();
        assert_eq!(
            action,
            CallbackAction::Vote {
                meeting_id: 3,
                slot_id: 7
            }
        );
    }

    #[test]
    fn test_parses_parameterless_actions() {
        assert_eq!(
            "create_meeting".parse::<CallbackAction>().unwrap(),
            CallbackAction::CreateMeeting
        );
        assert_eq!(
            "skip_description".parse::<CallbackAction>().unwrap(),
            CallbackAction::SkipDescription
        );
    }

    #[test]
    fn test_vote_with_missing_param_is_wrong_arity() {
        let err = "vote:abc".parse::<CallbackAction>().unwrap_err();
        assert!(matches!(err, CallbackError::WrongArity { got: 1, .. }));
    }

    #[test]
    fn test_non_numeric_id_is_invalid() {
        let err = "vote:abc:def".parse::<CallbackAction>().unwrap_err();
        assert!(matches!(err, CallbackError::InvalidId(_)));
    }

    #[test]
    fn test_unknown_action() {
        let err = "share:3".parse::<CallbackAction>().unwrap_err();
        assert!(matches!(err, CallbackError::UnknownAction(a) if a == "share"));
    }

    #[test]
    fn test_empty_payload() {
        assert!(matches!("".parse::<CallbackAction>(), Err(CallbackError::Empty)));
    }

    #[test]
    fn test_extra_params_rejected() {
        let err = "help:1".parse::<CallbackAction>().unwrap_err();
        assert!(matches!(err, CallbackError::WrongArity { expected: 0, .. }));
    }
}
