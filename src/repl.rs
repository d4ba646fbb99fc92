//! Interactive REPL loop (spec §6 collaborator). Grounded on the teacher's
//! `rustyline` REPL in `examples/TrevorS-lisp-llm-sandbox/src/main.rs`: a
//! persistent `Editor`
//! with history, the crate's syntax-highlighting `Helper`, and per-line
//! evaluation against one long-lived context — here, a [`rasp::Session`]
//! rather than the teacher's `Environment`/`MacroRegistry` pair.

use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};

use rasp::highlighter::RaspHelper;
use rasp::Session;

const HISTORY_FILE: &str = ".rasp_history";

pub fn run(session: &mut Session) -> rustyline::Result<()> {
    let config = Config::builder().auto_add_history(true).build();
    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(RaspHelper::new()));
    let _ = rl.load_history(HISTORY_FILE);

    println!("rasp - an S-expression language. Ctrl-D to exit.");

    loop {
        match rl.readline("rasp> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                match session.run("<repl>", &line) {
                    Ok(value) => println!("{}", value.display_human()),
                    Err(traced) => eprint!("{traced}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("readline error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
    Ok(())
}
