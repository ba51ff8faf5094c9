//! Console front end: one-shot commands, structured queries and a REPL

use std::fmt::Write as _;
use std::io::{self, BufRead, Write};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use valkey_admin::client::{ClusterClient, ControlPlane, StandaloneClient};
use valkey_admin::command::{dispatch, dispatch_admin, dispatch_family, CommandValue, Dispatched, Family};
use valkey_admin::config::{CliArgs, OutputFormat};
use valkey_admin::query::{auto_query, scan, AutoQuery, AutoQueryResult, ScanPage, ScanRequest, TimeToLive};

/// Connected client for either deployment
enum Session {
    Standalone(StandaloneClient),
    Cluster(ClusterClient),
}

impl Session {
    fn connect(args: &CliArgs) -> Result<Self> {
        let config = args.client_config().map_err(|e| anyhow!("Configuration error: {}", e))?;
        let session = if args.cluster_mode {
            Session::Cluster(ClusterClient::connect(config).context("Cluster connection failed")?)
        } else {
            Session::Standalone(StandaloneClient::connect(config).context("Connection failed")?)
        };
        Ok(session)
    }

    fn conn(&mut self) -> &mut dyn ControlPlane {
        match self {
            Session::Standalone(c) => c,
            Session::Cluster(c) => c,
        }
    }

    /// Release every connection the session holds
    fn close(mut self) {
        debug!("Closing session to {}", self.prompt());
        self.conn().close();
    }

    fn prompt(&self) -> String {
        match self {
            Session::Standalone(c) => c.endpoint().to_string(),
            Session::Cluster(c) => format!("{} (cluster)", c.endpoint()),
        }
    }
}

/// Entry point once logging is set up
pub fn run(args: &CliArgs) -> Result<()> {
    args.validate().map_err(|e| anyhow!("Invalid arguments: {}", e))?;
    let mut session = Session::connect(args)?;
    info!("Connected to {}", session.prompt());

    let outcome = run_session(&mut session, args);
    session.close();
    outcome
}

fn run_session(session: &mut Session, args: &CliArgs) -> Result<()> {
    if let Some(key) = &args.query {
        let result = auto_query(session.conn(), &AutoQuery::new(key.as_str(), args.dbnum, args.limit))?;
        return emit(args.output_format, &result, render_auto_query);
    }

    if let Some(pattern) = &args.scan {
        let mut request = ScanRequest::new(pattern.as_str())
            .with_cursor(args.cursor.as_str())
            .with_count(args.count);
        request.key_type = args.scan_type.clone();
        request.database = Some(args.dbnum);
        let page = scan(session.conn(), &request)?;
        return emit(args.output_format, &page, render_scan_page);
    }

    if args.nodes {
        return print_nodes(session, args.output_format);
    }

    if !args.command_args.is_empty() {
        let line = args.command_args.join(" ");
        let value = execute_line(session, args, &line)?;
        return emit(args.output_format, &value, render_value);
    }

    eprintln!("Type 'help' for available commands, 'quit' or Ctrl-D to exit.\n");
    run_repl(session, args)
}

/// Admin commands first, then the family dispatchers
fn execute_line(session: &mut Session, args: &CliArgs, line: &str) -> Result<CommandValue> {
    if let Some(value) = dispatch_admin(session.conn(), line, args.dbnum)? {
        return Ok(value);
    }
    let value = match args.family {
        Some(family) => {
            let family = Family::from(family);
            match dispatch_family(session.conn(), family, line, args.dbnum)? {
                Dispatched::Value(v) => v,
                Dispatched::Unmatched => {
                    debug!("'{}' is not a {} command", line, family);
                    CommandValue::Nil
                }
            }
        }
        None => dispatch(session.conn(), line, args.dbnum)?,
    };
    Ok(value)
}

fn print_nodes(session: &mut Session, format: OutputFormat) -> Result<()> {
    match session {
        Session::Standalone(client) => {
            let nodes = client.replication_nodes()?;
            emit(format, &nodes, |nodes| {
                let mut out = String::new();
                for (i, node) in nodes.iter().enumerate() {
                    let _ = writeln!(out, "{}) {} {}", i + 1, node.address(), node.role);
                }
                out
            })
        }
        Session::Cluster(client) => {
            let nodes = client.cluster_nodes()?;
            emit(format, &nodes, |nodes| {
                let mut out = String::new();
                for (i, node) in nodes.iter().enumerate() {
                    let _ = writeln!(
                        out,
                        "{}) {} {} {} {}",
                        i + 1,
                        node.node_id,
                        node.address(),
                        node.role,
                        node.slot_range.as_deref().unwrap_or("-")
                    );
                }
                out
            })
        }
    }
}

/// Print `value` as JSON or with the given text renderer
fn emit<T: Serialize>(format: OutputFormat, value: &T, render: impl Fn(&T) -> String) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => print!("{}", render(value)),
    }
    Ok(())
}

/// Run the Read-Eval-Print Loop
fn run_repl(session: &mut Session, args: &CliArgs) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let prompt = session.prompt();

    loop {
        print!("{}> ", prompt);
        stdout.flush()?;

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                // EOF (Ctrl-D)
                println!();
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                continue;
            }
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.to_lowercase().as_str() {
            "quit" | "exit" => break,
            "help" => {
                print_help();
                continue;
            }
            "clear" => {
                print!("\x1b[2J\x1b[H");
                stdout.flush()?;
                continue;
            }
            _ => {}
        }

        match execute_line(session, args, line) {
            Ok(value) => {
                if let Err(e) = emit(args.output_format, &value, render_value) {
                    eprintln!("(error) {}", e);
                }
            }
            Err(e) => eprintln!("(error) {}", e),
        }
    }

    Ok(())
}

/// valkey-cli style rendering of a command result
fn render_value(value: &CommandValue) -> String {
    let mut out = String::new();
    match value {
        CommandValue::Nil => out.push_str("(nil)\n"),
        CommandValue::Status(s) => {
            let _ = writeln!(out, "{}", s);
        }
        CommandValue::Integer(n) => {
            let _ = writeln!(out, "(integer) {}", n);
        }
        CommandValue::Float(f) => {
            let _ = writeln!(out, "(double) {}", f);
        }
        CommandValue::Text(s) => {
            let _ = writeln!(out, "\"{}\"", s);
        }
        CommandValue::List(items) if items.is_empty() => out.push_str("(empty array)\n"),
        CommandValue::List(items) => {
            for (i, item) in items.iter().enumerate() {
                let _ = write!(out, "{}) {}", i + 1, render_value(item));
            }
        }
        CommandValue::Set(members) if members.is_empty() => out.push_str("(empty array)\n"),
        CommandValue::Set(members) => {
            for (i, member) in members.iter().enumerate() {
                let _ = writeln!(out, "{}) \"{}\"", i + 1, member);
            }
        }
        CommandValue::Map(map) if map.is_empty() => out.push_str("(empty array)\n"),
        CommandValue::Map(map) => {
            for (i, (field, v)) in map.iter().enumerate() {
                let _ = writeln!(out, "{}) \"{}\"", 2 * i + 1, field);
                let _ = writeln!(out, "{}) \"{}\"", 2 * i + 2, v);
            }
        }
        CommandValue::Scored(members) if members.is_empty() => out.push_str("(empty array)\n"),
        CommandValue::Scored(members) => {
            for (i, m) in members.iter().enumerate() {
                let _ = writeln!(out, "{}) \"{}\"", 2 * i + 1, m.member);
                let _ = writeln!(out, "{}) \"{}\"", 2 * i + 2, m.score);
            }
        }
    }
    out
}

fn render_auto_query(result: &AutoQueryResult) -> String {
    let ttl = match result.ttl {
        TimeToLive::Unknown => "unknown".to_string(),
        TimeToLive::NoExpiry => "no expiry".to_string(),
        TimeToLive::Seconds(s) => format!("{}s", s),
    };
    format!("type: {}\nttl:  {}\n{}", result.key_type, ttl, render_value(&result.value))
}

fn render_scan_page(page: &ScanPage) -> String {
    let mut out = format!("cursor: {}\n", page.next_cursor);
    for (i, key) in page.items.iter().enumerate() {
        let _ = writeln!(out, "{}) \"{}\"", i + 1, key);
    }
    out
}

fn print_help() {
    println!(
        r#"
valkey-admin console
====================

Built-in commands:
  help     Show this help message
  quit     Exit the console (or use Ctrl-D)
  exit     Exit the console
  clear    Clear the screen

Server commands:
  INFO [section] | CLUSTER INFO | DBSIZE | ROLE
  EXISTS key... | DEL key...

Supported commands:
  string   GET key | SET key value
  hash     HGETALL key | HGET key field | HMGET key field... | HKEYS key
           HSET key field value [field value ...]
  list     LPUSH/RPUSH key value... | LINDEX key index | LLEN key
           LRANGE key start stop
  set      SADD key member... | SCARD key | SMEMBERS key
           SRANDMEMBER key [count]
  zset     ZADD key score member | ZCARD key | ZSCORE key member
           ZCOUNT key min max | ZRANGE key start stop [WITHSCORES]

Arguments are split on whitespace; quoting is not supported.
"#
    );
}
