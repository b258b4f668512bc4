//! Command Dispatcher
//!
//! Maps a decoded argument list to a [`Store`] operation and produces the
//! reply. The first argument is the command name, matched
//! case-insensitively; exact arity is validated before the store is
//! touched, so an arity or argument error never changes state.
//!
//! "Not found" outcomes on DEL/EXISTS/PERSIST/EXPIRE are normal `:0`
//! replies, not errors; only RENAME reports a missing key as an error.

use crate::protocol::Reply;
use crate::store::Store;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// The closed set of command-layer errors, each with a stable wire text.
///
/// Rendered on the wire as `-ERR <message>`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("wrong number of arguments for '{0}'")]
    WrongArity(&'static str),

    #[error("syntax error")]
    Syntax,

    #[error("invalid TTL")]
    InvalidTtl,

    #[error("invalid argument")]
    InvalidArgument,

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("no such key")]
    NoSuchKey,
}

impl CommandError {
    /// The error reply carrying this error's wire text.
    pub fn into_reply(self) -> Reply {
        Reply::error(format!("ERR {}", self))
    }
}

/// Executes commands against a shared [`Store`].
///
/// One handler is created per connection; all handlers share the same
/// store. Cloning is cheap (an `Arc` bump).
#[derive(Debug, Clone)]
pub struct CommandHandler {
    store: Arc<Store>,
}

impl CommandHandler {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Executes one decoded frame and returns the reply to send.
    ///
    /// Every failure is terminal to this command only and is returned as an
    /// error reply; the connection stays usable.
    pub fn execute(&self, args: Vec<Bytes>) -> Reply {
        let Some((name, rest)) = args.split_first() else {
            return Reply::error("ERR no command received");
        };
        let name = match std::str::from_utf8(name) {
            Ok(s) => s.to_ascii_uppercase(),
            Err(_) => return CommandError::InvalidArgument.into_reply(),
        };
        match self.dispatch(&name, rest) {
            Ok(reply) => reply,
            Err(e) => e.into_reply(),
        }
    }

    /// `args` holds everything after the command name.
    fn dispatch(&self, name: &str, args: &[Bytes]) -> Result<Reply, CommandError> {
        match name {
            "PING" => self.cmd_ping(args),
            "SET" => self.cmd_set(args),
            "GET" => self.cmd_get(args),
            "DEL" => self.cmd_del(args),
            "EXISTS" => self.cmd_exists(args),
            "PERSIST" => self.cmd_persist(args),
            "FLUSHALL" => self.cmd_flushall(args),
            "KEYS" => self.cmd_keys(args),
            "RENAME" => self.cmd_rename(args),
            "TTL" => self.cmd_ttl(args),
            "EXPIRE" => self.cmd_expire(args),
            _ => Err(CommandError::UnknownCommand(name.to_string())),
        }
    }

    /// PING → `+PONG`; PING msg → bulk echo.
    fn cmd_ping(&self, args: &[Bytes]) -> Result<Reply, CommandError> {
        match args {
            [] => Ok(Reply::pong()),
            [msg] => Ok(Reply::Bulk(msg.clone())),
            _ => Err(CommandError::WrongArity("PING")),
        }
    }

    /// SET key value \[EX seconds\]
    fn cmd_set(&self, args: &[Bytes]) -> Result<Reply, CommandError> {
        let ttl = match args.len() {
            2 => None,
            4 => {
                if !as_str(&args[2])?.eq_ignore_ascii_case("EX") {
                    return Err(CommandError::Syntax);
                }
                let seconds = parse_seconds(&args[3])?;
                // EX 0 behaves like no EX clause: the store treats a
                // non-positive TTL as "no expiry".
                (seconds > 0).then(|| Duration::from_secs(seconds))
            }
            _ => return Err(CommandError::WrongArity("SET")),
        };
        let key = as_str(&args[0])?.to_string();
        self.store.set(key, args[1].clone(), ttl);
        Ok(Reply::ok())
    }

    fn cmd_get(&self, args: &[Bytes]) -> Result<Reply, CommandError> {
        let [key] = args else {
            return Err(CommandError::WrongArity("GET"));
        };
        Ok(match self.store.get(as_str(key)?) {
            Some(value) => Reply::Bulk(value),
            None => Reply::Nil,
        })
    }

    fn cmd_del(&self, args: &[Bytes]) -> Result<Reply, CommandError> {
        let [key] = args else {
            return Err(CommandError::WrongArity("DEL"));
        };
        Ok(Reply::Integer(self.store.delete(as_str(key)?) as i64))
    }

    fn cmd_exists(&self, args: &[Bytes]) -> Result<Reply, CommandError> {
        let [key] = args else {
            return Err(CommandError::WrongArity("EXISTS"));
        };
        Ok(Reply::Integer(self.store.exists(as_str(key)?) as i64))
    }

    fn cmd_persist(&self, args: &[Bytes]) -> Result<Reply, CommandError> {
        let [key] = args else {
            return Err(CommandError::WrongArity("PERSIST"));
        };
        Ok(Reply::Integer(self.store.persist(as_str(key)?) as i64))
    }

    fn cmd_flushall(&self, args: &[Bytes]) -> Result<Reply, CommandError> {
        if !args.is_empty() {
            return Err(CommandError::WrongArity("FLUSHALL"));
        }
        self.store.flush_all();
        Ok(Reply::ok())
    }

    fn cmd_keys(&self, args: &[Bytes]) -> Result<Reply, CommandError> {
        let [pattern] = args else {
            return Err(CommandError::WrongArity("KEYS"));
        };
        let keys = self.store.keys(as_str(pattern)?);
        Ok(Reply::Array(keys.into_iter().map(Reply::bulk).collect()))
    }

    fn cmd_rename(&self, args: &[Bytes]) -> Result<Reply, CommandError> {
        let [old, new] = args else {
            return Err(CommandError::WrongArity("RENAME"));
        };
        // The store's rename is expiry-aware and atomic with the liveness
        // check, so there is no separate EXISTS pre-check to race against.
        if self.store.rename(as_str(old)?, as_str(new)?) {
            Ok(Reply::ok())
        } else {
            Err(CommandError::NoSuchKey)
        }
    }

    fn cmd_ttl(&self, args: &[Bytes]) -> Result<Reply, CommandError> {
        let [key] = args else {
            return Err(CommandError::WrongArity("TTL"));
        };
        Ok(Reply::Integer(self.store.ttl(as_str(key)?)))
    }

    fn cmd_expire(&self, args: &[Bytes]) -> Result<Reply, CommandError> {
        let [key, seconds] = args else {
            return Err(CommandError::WrongArity("EXPIRE"));
        };
        let seconds = parse_seconds(seconds)?;
        let applied = self.store.expire(as_str(key)?, Duration::from_secs(seconds));
        Ok(Reply::Integer(applied as i64))
    }
}

fn as_str(arg: &Bytes) -> Result<&str, CommandError> {
    std::str::from_utf8(arg).map_err(|_| CommandError::InvalidArgument)
}

/// Parses a non-negative number of seconds.
fn parse_seconds(arg: &Bytes) -> Result<u64, CommandError> {
    as_str(arg)?
        .parse::<i64>()
        .ok()
        .filter(|s| *s >= 0)
        .map(|s| s as u64)
        .ok_or(CommandError::InvalidTtl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    fn handler() -> CommandHandler {
        CommandHandler::new(Arc::new(Store::new()))
    }

    fn args(parts: &[&str]) -> Vec<Bytes> {
        parts.iter().map(|p| Bytes::from(p.to_string())).collect()
    }

    #[test]
    fn ping() {
        let h = handler();
        assert_eq!(h.execute(args(&["PING"])), Reply::pong());
        assert_eq!(h.execute(args(&["PING", "hello"])), Reply::bulk("hello"));
        assert_eq!(
            h.execute(args(&["PING", "a", "b"])),
            Reply::error("ERR wrong number of arguments for 'PING'")
        );
    }

    #[test]
    fn set_and_get() {
        let h = handler();
        assert_eq!(h.execute(args(&["SET", "a", "1"])), Reply::ok());
        assert_eq!(h.execute(args(&["GET", "a"])), Reply::bulk("1"));
        assert_eq!(h.execute(args(&["GET", "missing"])), Reply::Nil);
    }

    #[test]
    fn command_names_are_case_insensitive() {
        let h = handler();
        assert_eq!(h.execute(args(&["set", "a", "1"])), Reply::ok());
        assert_eq!(h.execute(args(&["GeT", "a"])), Reply::bulk("1"));
    }

    #[tokio::test(start_paused = true)]
    async fn set_with_ex() {
        let h = handler();
        assert_eq!(h.execute(args(&["SET", "a", "1", "EX", "100"])), Reply::ok());
        assert_eq!(h.execute(args(&["TTL", "a"])), Reply::Integer(100));

        // EX literal is case-insensitive.
        assert_eq!(h.execute(args(&["SET", "b", "1", "ex", "50"])), Reply::ok());
        assert_eq!(h.execute(args(&["TTL", "b"])), Reply::Integer(50));

        advance(Duration::from_secs(101)).await;
        assert_eq!(h.execute(args(&["GET", "a"])), Reply::Nil);
    }

    #[test]
    fn set_ex_zero_means_no_expiry() {
        let h = handler();
        assert_eq!(h.execute(args(&["SET", "a", "1", "EX", "0"])), Reply::ok());
        assert_eq!(h.execute(args(&["TTL", "a"])), Reply::Integer(-1));
    }

    #[test]
    fn set_argument_validation() {
        let h = handler();
        assert_eq!(
            h.execute(args(&["SET", "a"])),
            Reply::error("ERR wrong number of arguments for 'SET'")
        );
        assert_eq!(
            h.execute(args(&["SET", "a", "1", "EX"])),
            Reply::error("ERR wrong number of arguments for 'SET'")
        );
        assert_eq!(
            h.execute(args(&["SET", "a", "1", "PX", "5"])),
            Reply::error("ERR syntax error")
        );
        assert_eq!(
            h.execute(args(&["SET", "a", "1", "EX", "abc"])),
            Reply::error("ERR invalid TTL")
        );
        assert_eq!(
            h.execute(args(&["SET", "a", "1", "EX", "-1"])),
            Reply::error("ERR invalid TTL")
        );
        // Nothing was stored by the failed attempts.
        assert_eq!(h.execute(args(&["EXISTS", "a"])), Reply::Integer(0));
    }

    #[test]
    fn del_and_exists() {
        let h = handler();
        h.execute(args(&["SET", "a", "1"]));
        assert_eq!(h.execute(args(&["EXISTS", "a"])), Reply::Integer(1));
        assert_eq!(h.execute(args(&["DEL", "a"])), Reply::Integer(1));
        assert_eq!(h.execute(args(&["DEL", "a"])), Reply::Integer(0));
        assert_eq!(h.execute(args(&["EXISTS", "a"])), Reply::Integer(0));
    }

    #[tokio::test(start_paused = true)]
    async fn persist_and_expire() {
        let h = handler();
        h.execute(args(&["SET", "a", "1", "EX", "100"]));
        assert_eq!(h.execute(args(&["PERSIST", "a"])), Reply::Integer(1));
        assert_eq!(h.execute(args(&["TTL", "a"])), Reply::Integer(-1));
        assert_eq!(h.execute(args(&["PERSIST", "missing"])), Reply::Integer(0));

        assert_eq!(h.execute(args(&["EXPIRE", "a", "5"])), Reply::Integer(1));
        assert_eq!(h.execute(args(&["TTL", "a"])), Reply::Integer(5));
        assert_eq!(h.execute(args(&["EXPIRE", "missing", "5"])), Reply::Integer(0));
        assert_eq!(
            h.execute(args(&["EXPIRE", "a", "abc"])),
            Reply::error("ERR invalid TTL")
        );

        advance(Duration::from_secs(6)).await;
        assert_eq!(h.execute(args(&["TTL", "a"])), Reply::Integer(-2));
    }

    #[test]
    fn flushall() {
        let h = handler();
        h.execute(args(&["SET", "a", "1"]));
        h.execute(args(&["SET", "b", "2"]));
        assert_eq!(
            h.execute(args(&["FLUSHALL", "extra"])),
            Reply::error("ERR wrong number of arguments for 'FLUSHALL'")
        );
        assert_eq!(h.execute(args(&["FLUSHALL"])), Reply::ok());
        assert_eq!(h.execute(args(&["KEYS", "*"])), Reply::Array(vec![]));
    }

    #[test]
    fn keys_reply() {
        let h = handler();
        h.execute(args(&["SET", "user:a", "1"]));
        h.execute(args(&["SET", "user:ab", "2"]));
        assert_eq!(
            h.execute(args(&["KEYS", "user:?"])),
            Reply::Array(vec![Reply::bulk("user:a")])
        );
    }

    #[test]
    fn rename() {
        let h = handler();
        h.execute(args(&["SET", "old", "v"]));
        assert_eq!(h.execute(args(&["RENAME", "old", "new"])), Reply::ok());
        assert_eq!(h.execute(args(&["GET", "new"])), Reply::bulk("v"));
        assert_eq!(
            h.execute(args(&["RENAME", "old", "other"])),
            Reply::error("ERR no such key")
        );
    }

    #[test]
    fn unknown_command() {
        let h = handler();
        assert_eq!(
            h.execute(args(&["NOPE", "a"])),
            Reply::error("ERR unknown command 'NOPE'")
        );
    }

    #[test]
    fn empty_frame() {
        let h = handler();
        assert_eq!(h.execute(vec![]), Reply::error("ERR no command received"));
    }

    #[test]
    fn arity_checks() {
        let h = handler();
        for (cmd, bad) in [
            ("GET", vec!["GET"]),
            ("GET", vec!["GET", "a", "b"]),
            ("DEL", vec!["DEL"]),
            ("EXISTS", vec!["EXISTS", "a", "b"]),
            ("PERSIST", vec!["PERSIST"]),
            ("KEYS", vec!["KEYS"]),
            ("RENAME", vec!["RENAME", "a"]),
            ("TTL", vec!["TTL", "a", "b"]),
            ("EXPIRE", vec!["EXPIRE", "a"]),
        ] {
            assert_eq!(
                h.execute(args(&bad)),
                Reply::error(format!("ERR wrong number of arguments for '{}'", cmd))
            );
        }
    }
}
