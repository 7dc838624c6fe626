use std::{
    io::{self, Write},
    sync::atomic::{AtomicBool, Ordering},
};

use subcmd::{exit, Command};

static QUIET: AtomicBool = AtomicBool::new(false);

fn main() {
    env_logger::init();

    let mut greet = Command::new("greet")
        .with_usage_line("[-emoji] [-n count] <name>")
        .with_short("say hello");
    let emoji = greet.flags.bool("emoji", false, "end with a heart");
    let count = greet.flags.uint("n", 1, "how many times");
    greet.set_run(move |invocation, args| {
        let name = match args {
            [name] => name.to_string_lossy(),
            _ => exit::fatal(format_args!("{invocation}: expected exactly one name")),
        };
        let bang = if emoji.get() { "❣️" } else { "!" };
        for _ in 0..count.get() {
            println!("Hello {name}{bang}");
        }
        exit::SUCCESS
    });

    let echo = Command::new("echo")
        .with_usage_line("[arguments]")
        .with_short("print arguments verbatim, flags included")
        .with_custom_flags()
        .with_run(|_, args| {
            let mut out = io::stdout().lock();
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    let _ = out.write_all(b" ");
                }
                let _ = out.write_all(arg.as_encoded_bytes());
            }
            let _ = out.write_all(b"\n");
            exit::SUCCESS
        });

    let mut root = Command::new("hello")
        .with_usage_line("[-q] <command> [arguments]")
        .with_long("hello greets people.")
        .with_subcommand(greet)
        .with_subcommand(echo);
    let quiet = root.flags.bool("q", false, "skip the farewell");

    exit::at_exit(|| {
        if !QUIET.load(Ordering::Relaxed) {
            eprintln!("bye");
        }
    });

    subcmd::run(&mut root);
    QUIET.store(quiet.get(), Ordering::Relaxed);
    exit::exit_if_errors();
    log::debug!("all done");
    exit::exit()
}
