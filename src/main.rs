use std::error::Error;

use clap::{command, Parser, Subcommand};
use eframe::run_native;
use larkrise::{
    bridge::{self, SystemBridge},
    config::Config,
    controller::AlarmController,
    state::AlarmState,
    AlarmClock,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write a fresh default config
    Init {
        #[clap(long, short)]
        force: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    simple_file_logger::init_logger!("larkrise").expect("couldn't initialize logger");

    let args = Args::parse();
    if let Some(Command::Init { force }) = args.command {
        if force || !Config::is_config_present() {
            Config::new().save(Config::config_path());
        }
        return Ok(());
    }

    let config = Config::load_or_default(Config::config_path());

    // the bridge worker owns the OS side, the gui thread owns everything else
    let (requests, replies) = bridge::spawn(SystemBridge::new());
    let state = AlarmState::new(config.alarm_sound.clone());
    let mut controller = AlarmController::new(state, config.sound_edit_policy, requests, replies);

    let native_options = eframe::NativeOptions {
        initial_window_size: Some(eframe::egui::vec2(440.0, 560.0)),
        ..Default::default()
    };
    run_native(
        "Larkrise",
        native_options,
        Box::new(move |cc| {
            // repaint on every state publish so the gui tracks the controller
            let repaint_ctx = cc.egui_ctx.clone();
            controller.subscribe(move |_| repaint_ctx.request_repaint());
            Box::new(AlarmClock::new(config, controller))
        }),
    )
    .map_err(Into::into)
}
