use std::collections::HashMap;

use clap::Parser;
use notify_out::config::NotifyConfig;
use notify_out::dns::enums::DNSResourceClass;
use notify_out::notify::{NotifyOut, NotifyTarget};
use tracing::{error, info};

/// Send RFC 1996 NOTIFY queries to a zone's secondaries on demand.
///
/// Zones are registered directly from the command line rather than
/// discovered from a running authoritative server; this binary is meant
/// to drive the notify-out core standalone or from a script.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Zone to register, e.g. "example.com" or "example.com:CH". May be
    /// repeated; defaults to class IN.
    #[arg(short = 'z', long = "zone")]
    zones: Vec<String>,

    /// Secondary to notify for a zone, as "zone=host[#port]". May be
    /// repeated per zone; port defaults to 53.
    #[arg(short = 's', long = "slave")]
    slaves: Vec<String>,

    /// Fire a NOTIFY round immediately for this zone on startup. May be
    /// repeated; must name a zone also passed via --zone.
    #[arg(short = 'n', long = "notify")]
    notify: Vec<String>,
}

fn parse_zone_spec(spec: &str) -> (String, DNSResourceClass) {
    match spec.split_once(':') {
        Some((name, class)) => (
            name.to_string(),
            class.parse().unwrap_or(DNSResourceClass::IN),
        ),
        None => (spec.to_string(), DNSResourceClass::IN),
    }
}

fn parse_slave_spec(spec: &str) -> Option<(String, NotifyTarget)> {
    let (zone, target) = spec.split_once('=')?;
    let (address, port) = match target.split_once('#') {
        Some((address, port)) => (address.to_string(), port.parse().ok()?),
        None => (target.to_string(), 53),
    };
    Some((
        zone.to_string(),
        NotifyTarget {
            address,
            port,
        },
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();

    let config = NotifyConfig::from_env()?;
    config.validate()?;
    info!(?config, "starting notify-out");

    let mut slaves_by_zone: HashMap<String, Vec<NotifyTarget>> = HashMap::new();
    for spec in &args.slaves {
        match parse_slave_spec(spec) {
            Some((zone, target)) => slaves_by_zone.entry(zone).or_default().push(target),
            None => error!(spec = %spec, "malformed --slave, expected zone=host[#port]"),
        }
    }

    let controller = NotifyOut::new(config);

    for spec in &args.zones {
        let (name, class) = parse_zone_spec(spec);
        let slaves = slaves_by_zone.remove(&name).unwrap_or_default();
        info!(zone = %name, class = %class, slaves = slaves.len(), "registered zone");
        controller.register_zone(&name, class, slaves);
    }

    let dispatcher = controller.dispatcher();

    for spec in &args.notify {
        let (name, class) = parse_zone_spec(spec);
        controller.send_notify(&name, class);
    }

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested, draining in-flight notifies");
    controller.shutdown().await;
    dispatcher.await?;

    Ok(())
}
