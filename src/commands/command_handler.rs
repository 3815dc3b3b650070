use crate::{
    commands::{
        blpop::{blpop, BlpopArguments},
        command_error::CommandError,
        config_get::{config_get, ConfigGetArguments},
        echo::{echo, EchoArguments},
        get::{get, GetArguments},
        incr::{incr, IncrArguments},
        info::{info, InfoArguments},
        keys::{keys, KeysArguments},
        llen::{llen, LlenArguments},
        lpop::{lpop, LpopArguments},
        lrange::{lrange, LrangeArguments},
        ping::{ping, PingArguments},
        pub_sub::{publish, PublishArguments, SubscribeArguments, UnsubscribeArguments},
        replication::{psync, replconf, wait, PsyncArguments, ReplconfArguments, WaitArguments},
        rpush_and_lpush::{lpush, rpush, PushArrayOperations},
        set::{set, SetArguments},
        sorted_sets::{
            zadd, zcard, zrange, zrank, zrem, zscore, ZaddArguments, ZcardArguments,
            ZrangeArguments, ZrankArguments, ZremArguments, ZscoreArguments,
        },
        transactions::{DiscardArguments, ExecArguments, MultiArguments},
        type_command::{type_command, TypeArguments},
        xadd::{xadd, XaddArguments},
        xrange::{xrange, XrangeArguments},
        xread::{xread, xread_without_blocking, XreadArguments},
    },
    resp::RespValue,
    state::State,
};

/// Every command the server knows, resolved once from the command name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Ping,
    Echo,
    Get,
    Set,
    Incr,
    Keys,
    Type,
    Config,
    Info,
    Multi,
    Exec,
    Discard,
    Subscribe,
    Unsubscribe,
    Publish,
    Blpop,
    Lpush,
    Rpush,
    Lpop,
    Llen,
    Lrange,
    Xadd,
    Xrange,
    Xread,
    Zadd,
    Zcard,
    Zrange,
    Zrank,
    Zrem,
    Zscore,
    Replconf,
    Psync,
    Wait,
    Quit,
    Reset,
    Unknown,
}

impl CommandKind {
    /// `name` must already be upper case.
    pub fn from_name(name: &str) -> Self {
        match name {
            "PING" => CommandKind::Ping,
            "ECHO" => CommandKind::Echo,
            "GET" => CommandKind::Get,
            "SET" => CommandKind::Set,
            "INCR" => CommandKind::Incr,
            "KEYS" => CommandKind::Keys,
            "TYPE" => CommandKind::Type,
            "CONFIG" => CommandKind::Config,
            "INFO" => CommandKind::Info,
            "MULTI" => CommandKind::Multi,
            "EXEC" => CommandKind::Exec,
            "DISCARD" => CommandKind::Discard,
            "SUBSCRIBE" => CommandKind::Subscribe,
            "UNSUBSCRIBE" => CommandKind::Unsubscribe,
            "PUBLISH" => CommandKind::Publish,
            "BLPOP" => CommandKind::Blpop,
            "LPUSH" => CommandKind::Lpush,
            "RPUSH" => CommandKind::Rpush,
            "LPOP" => CommandKind::Lpop,
            "LLEN" => CommandKind::Llen,
            "LRANGE" => CommandKind::Lrange,
            "XADD" => CommandKind::Xadd,
            "XRANGE" => CommandKind::Xrange,
            "XREAD" => CommandKind::Xread,
            "ZADD" => CommandKind::Zadd,
            "ZCARD" => CommandKind::Zcard,
            "ZRANGE" => CommandKind::Zrange,
            "ZRANK" => CommandKind::Zrank,
            "ZREM" => CommandKind::Zrem,
            "ZSCORE" => CommandKind::Zscore,
            "REPLCONF" => CommandKind::Replconf,
            "PSYNC" => CommandKind::Psync,
            "WAIT" => CommandKind::Wait,
            "QUIT" => CommandKind::Quit,
            "RESET" => CommandKind::Reset,
            _ => CommandKind::Unknown,
        }
    }

    /// Commands that modify the keyspace. They are propagated to replicas
    /// and refused from clients of a replica.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            CommandKind::Set
                | CommandKind::Incr
                | CommandKind::Lpush
                | CommandKind::Rpush
                | CommandKind::Lpop
                | CommandKind::Blpop
                | CommandKind::Xadd
                | CommandKind::Zadd
                | CommandKind::Zrem
        )
    }
}

#[derive(Debug, PartialEq)]
pub enum CommandResult {
    Response(RespValue),
    /// PSYNC accepted: the connection becomes a replica link and receives
    /// the snapshot.
    Sync,
    /// REPLCONF ACK from a replica. Nothing is written back.
    Acknowledgment(u64),
}

impl CommandResult {
    /// The reply to write back to the caller, if any.
    pub fn into_reply(self) -> Option<RespValue> {
        match self {
            CommandResult::Response(value) => Some(value),
            CommandResult::Sync | CommandResult::Acknowledgment(_) => None,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct CommandHandler {
    pub kind: CommandKind,
    /// Upper-cased command name.
    pub name: String,
    pub arguments: Vec<String>,
    pub input: RespValue,
    /// Size of the frame the command was decoded from.
    pub size: usize,
}

impl CommandHandler {
    pub fn new(input: RespValue, size: usize) -> Result<Self, CommandError> {
        let RespValue::Array(elements) = &input else {
            return Err(CommandError::InvalidCommand);
        };

        let mut parts = Vec::with_capacity(elements.len());

        for element in elements {
            match element {
                RespValue::BulkString(s) => parts.push(s.clone()),
                _ => return Err(CommandError::InvalidCommand),
            }
        }

        if parts.is_empty() {
            return Err(CommandError::InvalidCommand);
        }

        let arguments = parts.split_off(1);
        let name = parts.remove(0).to_uppercase();

        Ok(Self {
            kind: CommandKind::from_name(&name),
            name,
            arguments,
            input,
            size,
        })
    }

    /// Checks the arguments without running the command, so that a queued
    /// command fails at `MULTI` time rather than at `EXEC` time.
    pub fn validate_command_arguments(&self) -> Result<(), CommandError> {
        let arguments = self.arguments.clone();

        match self.kind {
            CommandKind::Ping => PingArguments::parse(arguments).map(drop),
            CommandKind::Echo => EchoArguments::parse(arguments).map(drop),
            CommandKind::Get => GetArguments::parse(arguments).map(drop),
            CommandKind::Set => SetArguments::parse(arguments).map(drop),
            CommandKind::Incr => IncrArguments::parse(arguments).map(drop),
            CommandKind::Keys => KeysArguments::parse(arguments).map(drop),
            CommandKind::Type => TypeArguments::parse(arguments).map(drop),
            CommandKind::Config => ConfigGetArguments::parse(arguments).map(drop),
            CommandKind::Info => InfoArguments::parse(arguments).map(drop),
            CommandKind::Multi => MultiArguments::parse(arguments).map(drop),
            CommandKind::Exec => ExecArguments::parse(arguments).map(drop),
            CommandKind::Discard => DiscardArguments::parse(arguments).map(drop),
            CommandKind::Subscribe => SubscribeArguments::parse(arguments).map(drop),
            CommandKind::Unsubscribe => UnsubscribeArguments::parse(arguments).map(drop),
            CommandKind::Publish => PublishArguments::parse(arguments).map(drop),
            CommandKind::Blpop => BlpopArguments::parse(arguments).map(drop),
            CommandKind::Lpush => PushArrayOperations::parse(arguments, true).map(drop),
            CommandKind::Rpush => PushArrayOperations::parse(arguments, false).map(drop),
            CommandKind::Lpop => LpopArguments::parse(arguments).map(drop),
            CommandKind::Llen => LlenArguments::parse(arguments).map(drop),
            CommandKind::Lrange => LrangeArguments::parse(arguments).map(drop),
            CommandKind::Xadd => XaddArguments::parse(arguments).map(drop),
            CommandKind::Xrange => XrangeArguments::parse(arguments).map(drop),
            CommandKind::Xread => XreadArguments::parse(arguments).map(drop),
            CommandKind::Zadd => ZaddArguments::parse(arguments).map(drop),
            CommandKind::Zcard => ZcardArguments::parse(arguments).map(drop),
            CommandKind::Zrange => ZrangeArguments::parse(arguments).map(drop),
            CommandKind::Zrank => ZrankArguments::parse(arguments).map(drop),
            CommandKind::Zrem => ZremArguments::parse(arguments).map(drop),
            CommandKind::Zscore => ZscoreArguments::parse(arguments).map(drop),
            CommandKind::Replconf => ReplconfArguments::parse(arguments).map(drop),
            CommandKind::Psync => PsyncArguments::parse(arguments).map(drop),
            CommandKind::Wait => WaitArguments::parse(arguments).map(drop),
            CommandKind::Quit => Ok(()),
            CommandKind::Reset if arguments.is_empty() => Ok(()),
            CommandKind::Reset => Err(CommandError::wrong_arity("reset")),
            CommandKind::Unknown => Err(CommandError::UnknownCommand(self.name.clone())),
        }
    }

    /// Runs a server-scoped command against the shared state.
    pub async fn handle_command(&self, state: &State) -> Result<CommandResult, CommandError> {
        let arguments = self.arguments.clone();

        match self.kind {
            CommandKind::Ping => ping(arguments),
            CommandKind::Echo => echo(arguments),
            CommandKind::Get => get(&state.store, arguments).await,
            CommandKind::Set => set(&state.store, arguments).await,
            CommandKind::Incr => incr(&state.store, arguments).await,
            CommandKind::Keys => keys(&state.store, arguments).await,
            CommandKind::Type => type_command(&state.store, arguments).await,
            CommandKind::Config => config_get(state, arguments).await,
            CommandKind::Info => info(state, arguments).await,
            CommandKind::Publish => publish(&state.broker, arguments).await,
            // Never blocks here, the dispatcher drives blocking pops.
            CommandKind::Blpop => blpop(state, arguments).await,
            CommandKind::Lpush => lpush(state, arguments).await,
            CommandKind::Rpush => rpush(state, arguments).await,
            CommandKind::Lpop => lpop(&state.store, arguments).await,
            CommandKind::Llen => llen(&state.store, arguments).await,
            CommandKind::Lrange => lrange(&state.store, arguments).await,
            CommandKind::Xadd => xadd(state, arguments).await,
            CommandKind::Xrange => xrange(&state.store, arguments).await,
            CommandKind::Xread => xread(state, arguments).await,
            CommandKind::Zadd => zadd(&state.store, arguments).await,
            CommandKind::Zcard => zcard(&state.store, arguments).await,
            CommandKind::Zrange => zrange(&state.store, arguments).await,
            CommandKind::Zrank => zrank(&state.store, arguments).await,
            CommandKind::Zrem => zrem(&state.store, arguments).await,
            CommandKind::Zscore => zscore(&state.store, arguments).await,
            CommandKind::Replconf => replconf(state, arguments).await,
            CommandKind::Psync => psync(state, arguments).await,
            CommandKind::Wait => wait(state, arguments).await,
            // Connection-scoped, run by the dispatcher.
            CommandKind::Multi
            | CommandKind::Exec
            | CommandKind::Discard
            | CommandKind::Subscribe
            | CommandKind::Unsubscribe
            | CommandKind::Quit
            | CommandKind::Reset => Err(CommandError::NotAllowedInTransaction),
            CommandKind::Unknown => Err(CommandError::UnknownCommand(self.name.clone())),
        }
    }

    /// Runs a command queued by MULTI. Blocking reads return at once.
    pub async fn handle_queued_command(
        &self,
        state: &State,
    ) -> Result<CommandResult, CommandError> {
        match self.kind {
            CommandKind::Xread => xread_without_blocking(state, self.arguments.clone()).await,
            _ => self.handle_command(state).await,
        }
    }

    /// The command to forward to replicas after a successful run, if any.
    ///
    /// Commands whose effect depends on local state are rewritten into a
    /// deterministic form: a served BLPOP becomes `LPOP key` and XADD carries
    /// the id that was assigned.
    pub fn propagation(&self, result: &CommandResult) -> Option<RespValue> {
        if !self.kind.is_write() {
            return None;
        }

        match (self.kind, result) {
            (CommandKind::Blpop, CommandResult::Response(RespValue::Array(reply))) => {
                let key = reply.first()?.as_str()?;
                Some(RespValue::array_of_bulk_strings(["LPOP", key]))
            }
            (CommandKind::Blpop, _) => None,
            (CommandKind::Xadd, CommandResult::Response(RespValue::BulkString(id))) => {
                let mut parts = vec!["XADD".to_string()];
                parts.extend(self.arguments.iter().cloned());
                parts[2] = id.clone();

                Some(RespValue::array_of_bulk_strings(parts))
            }
            _ => Some(self.input.clone()),
        }
    }
}
