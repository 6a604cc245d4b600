use std::time::Duration;

use clap::{arg, command, value_parser, ArgMatches};

use marzocco::bluetooth::{self, BtleScanner, LmBluetoothClient, LmScanner};
use marzocco::operations::LmMachine;
use marzocco::protocol::*;
use marzocco::{info, logging};

fn machine_command(name: &'static str, about: &'static str) -> clap::Command {
    command!(name)
        .about(about)
        .arg(
            arg!(--username <USERNAME> "Account user name")
                .env("LM_USERNAME")
                .required(true),
        )
        .arg(
            arg!(--serial <SERIAL> "Machine serial number")
                .env("LM_SERIAL")
                .required(true),
        )
        .arg(
            arg!(--token <TOKEN> "Machine communication key")
                .env("LM_TOKEN")
                .required(true),
        )
        .arg(
            arg!(--model <MODEL> "Machine model")
                .env("LM_MODEL")
                .value_parser(["gs3av", "gs3mp", "mini", "micra"])
                .default_value("micra"),
        )
        .arg(arg!(--address <ADDRESS> "Bluetooth address of the machine, skipping discovery"))
}

fn credentials(cmd: &ArgMatches) -> Credentials {
    let get = |name: &str| {
        cmd.get_one::<String>(name)
            .expect("Credentials required")
            .clone()
    };
    Credentials::new(get("username"), get("serial"), get("token"))
}

fn switch_state(cmd: &ArgMatches) -> bool {
    cmd.get_one::<String>("state").map(String::as_str) == Some("on")
}

async fn open_machine(
    cmd: &ArgMatches,
    config: BluetoothConfig,
) -> Result<LmMachine, Box<dyn std::error::Error>> {
    let model: MachineModel = cmd
        .get_one::<String>("model")
        .expect("Model has a default")
        .parse()?;
    let scanner = BtleScanner::new(&config).await?;
    let client = if let Some(address) = cmd.get_one::<String>("address") {
        let driver = scanner.open(address).await?;
        LmBluetoothClient::from_device(credentials(cmd), driver, config)
    } else {
        info!("Looking for a machine...");
        LmBluetoothClient::create(credentials(cmd), &scanner, true, config).await?
    };
    info!(
        "Using {} at {}",
        model.full_model_name(),
        client.address()?
    );
    Ok(LmMachine::new(model, client))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let state = arg!(<state> "Switch state").value_parser(["on", "off"]);
    let matches = command!()
        .arg(arg!(--trace "Trace Bluetooth traffic to stderr").global(true))
        .arg(
            arg!(--"scan-secs" <SECONDS> "How long to listen for machines")
                .value_parser(value_parser!(u64))
                .default_value("10")
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(command!("scan").about("List nearby machines"))
        .subcommand(machine_command("power", "Turn the machine on or put it in standby").arg(state.clone()))
        .subcommand(machine_command("steam", "Turn the steam boiler on or off").arg(state.clone()))
        .subcommand(
            machine_command("temp", "Set a boiler target temperature")
                .arg(
                    arg!(--boiler <BOILER> "Boiler to set")
                        .value_parser(["coffee", "steam"])
                        .default_value("coffee"),
                )
                .arg(
                    arg!(--value <CELSIUS> "Target temperature in degrees Celsius")
                        .value_parser(value_parser!(f64))
                        .required(true),
                ),
        )
        .subcommand(
            machine_command("steam-level", "Set the Linea Micra steam level").arg(
                arg!(<level> "Steam level (1-3)").value_parser(value_parser!(u8).range(1..=3)),
            ),
        )
        .get_matches();

    let (subcommand, cmd) = matches.subcommand().expect("Subcommand required");
    if cmd.get_flag("trace") {
        logging::enable_tracing();
    }
    let scan_secs = *cmd
        .get_one::<u64>("scan-secs")
        .expect("Scan time has a default");
    let config = BluetoothConfig {
        scan_duration: Duration::from_secs(scan_secs),
        ..Default::default()
    };

    match subcommand {
        "scan" => {
            let scanner = BtleScanner::new(&config).await?;
            let machines = bluetooth::scan(&scanner, &config).await?;
            if machines.is_empty() {
                info!("No machines found");
            }
            for machine in machines {
                info!("{}  {}", machine.name.unwrap_or_default(), machine.address);
            }
        }
        "power" => {
            let mut machine = open_machine(cmd, config).await?;
            machine.set_power(switch_state(cmd)).await?;
        }
        "steam" => {
            let mut machine = open_machine(cmd, config).await?;
            machine.set_steam(switch_state(cmd)).await?;
        }
        "temp" => {
            let boiler: BoilerType = cmd
                .get_one::<String>("boiler")
                .expect("Boiler has a default")
                .parse()?;
            let celsius = *cmd.get_one::<f64>("value").expect("Temperature required");
            let mut machine = open_machine(cmd, config).await?;
            machine.set_temp(boiler, celsius).await?;
        }
        "steam-level" => {
            let level = cmd
                .get_one::<u8>("level")
                .copied()
                .and_then(SteamLevel::from_number)
                .expect("Steam level required");
            let mut machine = open_machine(cmd, config).await?;
            machine.set_steam_level(level).await?;
        }
        _ => {}
    }

    Ok(())
}
