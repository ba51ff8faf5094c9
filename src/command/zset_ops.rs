//! Sorted set commands: ZCARD, ZSCORE, ZCOUNT, ZRANGE, ZADD

use super::dispatch::{args, integer, required, score, score_bound, DispatchEntry, PlannedCommand};
use super::tokenizer::Tokens;
use super::value::ReplyShape;
use crate::utils::Result;

pub(crate) const TABLE: &[DispatchEntry] = &[
    DispatchEntry { pattern: "ZCARD", handler: zcard },
    DispatchEntry { pattern: "ZSCORE", handler: zscore },
    DispatchEntry { pattern: "ZCOUNT", handler: zcount },
    DispatchEntry { pattern: "ZRANGE", handler: zrange },
    DispatchEntry { pattern: "ZADD", handler: zadd },
];

fn zcard(tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    Ok(PlannedCommand::new(args("ZCARD", [key]), ReplyShape::Integer))
}

fn zscore(tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    let member = required(tokens, 2, "a member")?;
    Ok(PlannedCommand::new(args("ZSCORE", [key, member]), ReplyShape::Float))
}

fn zcount(tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    let min = score_bound(tokens, 2, "min")?;
    let max = score_bound(tokens, 3, "max")?;
    Ok(PlannedCommand::new(args("ZCOUNT", [key, min, max]), ReplyShape::Integer))
}

/// Any fifth token asks for scores
fn zrange(tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    let start = integer(tokens, 2, "start")?.to_string();
    let stop = integer(tokens, 3, "stop")?.to_string();

    let mut argv = args("ZRANGE", [key, start.as_str(), stop.as_str()]);
    let reply = if tokens.len() > 4 {
        argv.push("WITHSCORES".to_string());
        ReplyShape::Scored
    } else {
        ReplyShape::List
    };
    Ok(PlannedCommand::new(argv, reply))
}

fn zadd(tokens: &Tokens) -> Result<PlannedCommand> {
    let key = required(tokens, 1, "a key")?;
    let score = score(tokens, 2)?.to_string();
    let member = required(tokens, 3, "a member")?;
    Ok(PlannedCommand::new(
        args("ZADD", [key, score.as_str(), member]),
        ReplyShape::Integer,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::control_plane::mock::{array, bulk, ok, MockControlPlane};
    use crate::command::dispatch::{dispatch, dispatch_family, plan, Family};
    use crate::command::tokenizer::tokenize;
    use crate::command::value::{CommandValue, ScoredMember};
    use crate::utils::{AdminError, RespValue};

    fn planned(raw: &str) -> Result<PlannedCommand> {
        plan(Family::SortedSet, &tokenize(raw).unwrap()).map(|p| p.unwrap())
    }

    #[test]
    fn test_zadd_non_numeric_score_never_reaches_store() {
        let mut conn = MockControlPlane::default();
        let err = dispatch(&mut conn, "ZADD myset notanumber member", 0).unwrap_err();
        assert!(matches!(err, AdminError::InvalidArgument { argument: "score", .. }));
        assert!(conn.calls.is_empty());
    }

    #[test]
    fn test_zadd_rejects_nan() {
        assert!(matches!(
            planned("ZADD board nan alice"),
            Err(AdminError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_zadd_args() {
        assert_eq!(
            planned("zadd board 1.5 Alice").unwrap().args,
            vec!["ZADD", "board", "1.5", "Alice"]
        );
    }

    #[test]
    fn test_zcard_needs_only_key() {
        assert_eq!(planned("ZCARD board").unwrap().args, vec!["ZCARD", "board"]);
    }

    #[test]
    fn test_zcount_bounds() {
        assert_eq!(
            planned("ZCOUNT board -inf (10").unwrap().args,
            vec!["ZCOUNT", "board", "-inf", "(10"]
        );
        assert!(matches!(
            planned("ZCOUNT board low high"),
            Err(AdminError::InvalidArgument { argument: "min", .. })
        ));
    }

    #[test]
    fn test_zrange_with_fifth_token() {
        let plain = planned("ZRANGE board 0 -1").unwrap();
        assert_eq!(plain.reply, ReplyShape::List);

        let scored = planned("ZRANGE board 0 -1 withscores").unwrap();
        assert_eq!(scored.args, vec!["ZRANGE", "board", "0", "-1", "WITHSCORES"]);
        assert_eq!(scored.reply, ReplyShape::Scored);
    }

    #[test]
    fn test_zrange_scored_reply() {
        let mut conn = MockControlPlane::new(vec![ok(), array(&["alice", "1", "bob", "2.5"])]);
        let result = dispatch_family(&mut conn, Family::SortedSet, "ZRANGE board 0 1 x", 0)
            .unwrap()
            .into_value();
        assert_eq!(
            result,
            CommandValue::Scored(vec![
                ScoredMember { member: "alice".into(), score: 1.0 },
                ScoredMember { member: "bob".into(), score: 2.5 },
            ])
        );
    }

    #[test]
    fn test_zscore_missing_member() {
        let mut conn = MockControlPlane::new(vec![ok(), RespValue::Null, ok(), bulk("3")]);
        let missing = dispatch_family(&mut conn, Family::SortedSet, "ZSCORE board nobody", 0)
            .unwrap()
            .into_value();
        let present = dispatch_family(&mut conn, Family::SortedSet, "ZSCORE board alice", 0)
            .unwrap()
            .into_value();
        assert_eq!(missing, CommandValue::Nil);
        assert_eq!(present, CommandValue::Float(3.0));
    }
}
