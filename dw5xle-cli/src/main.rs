use clap::{Parser, Subcommand};
use std::path::PathBuf;

use dw5xle_core::{
    list_backups, parse_slot_index, EditorSession, Field, Result, MOD_EXTENSION, NUM_SLOTS_TOTAL,
};

#[derive(Debug, Parser)]
#[command(
    name = "dw5xle",
    version,
    about = "Dynasty Warriors 5 XL unit data editor"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Locate the unit table in a disc image and report its offset.
    Info {
        image: PathBuf,
    },
    /// Show the decoded fields of one unit slot.
    Show {
        image: PathBuf,

        /// Slot index, decimal or hex (0x0..0x37E).
        #[arg(long)]
        slot: String,

        /// Print the record as JSON instead of a field table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Edit fields of one slot, then save a mod file or patch the image.
    Set {
        image: PathBuf,

        #[arg(long)]
        slot: String,

        /// Field assignments, e.g. Life=255 Attack=0xC8.
        #[arg(value_name = "FIELD=VALUE", required = true)]
        assignments: Vec<String>,

        /// Write the edited table to this mod file.
        #[arg(long, conflicts_with = "write")]
        out: Option<PathBuf>,

        /// Patch the edited table straight back into the image.
        #[arg(long, default_value_t = false)]
        write: bool,
    },
    /// Dump the current unit table to a standalone mod file.
    Dump {
        image: PathBuf,

        #[arg(long)]
        out: PathBuf,
    },
    /// Apply a previously saved mod or backup block to the image.
    Apply {
        image: PathBuf,

        #[arg(long)]
        modfile: PathBuf,
    },
    /// Re-apply the image's original backup snapshot.
    Restore {
        image: PathBuf,
    },
    /// List backup snapshots under a directory.
    Backups {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

fn parse_slot(text: &str) -> std::result::Result<usize, String> {
    parse_slot_index(text).ok_or_else(|| {
        format!(
            "invalid slot index {:?}: expected 0x0..{:#x}",
            text,
            NUM_SLOTS_TOTAL - 1
        )
    })
}

fn parse_value(text: &str) -> Option<u32> {
    let t = text.trim();
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        t.parse::<u32>().ok()
    }
}

fn parse_assignment(text: &str) -> std::result::Result<(Field, u32), String> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got {:?}", text))?;
    let field = Field::from_label(name.trim())
        .ok_or_else(|| format!("unknown field {:?}", name.trim()))?;
    let value =
        parse_value(value).ok_or_else(|| format!("invalid value {:?} for {}", value, name))?;
    Ok((field, value))
}

fn print_record(slot: usize, record: &dw5xle_core::UnitRecord, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(record).unwrap());
        return;
    }

    println!("Slot {:#x}:", slot);
    for field in Field::ALL {
        if field.hidden() {
            continue;
        }
        println!("  {:<12} {}", field.label(), record.get(field));
    }
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Info { image } => {
            let session = EditorSession::open(&image)?;
            println!("Unit table offset: {:#x}", session.table_offset());
            println!("Slots: {:#x}..{:#x}", 0, NUM_SLOTS_TOTAL - 1);
            if session.backup_created() {
                println!("Backup written: {}", session.backup_path().display());
            } else {
                println!("Backup already exists: {}", session.backup_path().display());
            }
        }
        Command::Show { image, slot, json } => {
            let slot = parse_slot(&slot).map_err(invalid_input)?;
            let session = EditorSession::open(&image)?;
            let record = session.record(slot)?;
            print_record(slot, &record, json);
        }
        Command::Set {
            image,
            slot,
            assignments,
            out,
            write,
        } => {
            let slot = parse_slot(&slot).map_err(invalid_input)?;
            let mut session = EditorSession::open(&image)?;

            let mut record = session.record(slot)?;
            for assignment in &assignments {
                let (field, value) = parse_assignment(assignment).map_err(invalid_input)?;
                record.set(field, value);
            }
            session.submit(slot, &record)?;

            if let Some(out) = out {
                session.save_mod(&out)?;
                println!("Saved mod file: {}", out.display());
            } else if write {
                session.write_to_image()?;
                println!("Patched slot {:#x} into {}", slot, image.display());
            } else {
                println!(
                    "Slot {:#x} edited in memory only; pass --out <file.{}> or --write",
                    slot, MOD_EXTENSION
                );
            }
        }
        Command::Dump { image, out } => {
            let session = EditorSession::open(&image)?;
            session.save_mod(&out)?;
            println!("Dumped unit table to {}", out.display());
        }
        Command::Apply { image, modfile } => {
            let mut session = EditorSession::open(&image)?;
            session.load_mod(&modfile)?;
            session.write_to_image()?;
            println!(
                "Applied {} at offset {:#x}",
                modfile.display(),
                session.table_offset()
            );
        }
        Command::Restore { image } => {
            let mut session = EditorSession::open(&image)?;
            session.restore_backup()?;
            println!("Restored backup {}", session.backup_path().display());
        }
        Command::Backups { dir } => {
            let backups = list_backups(&dir)?;
            if backups.is_empty() {
                println!("No backups under {}", dir.display());
            }
            for path in backups {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}

fn invalid_input(message: String) -> dw5xle_core::EditorError {
    dw5xle_core::EditorError::Config(message)
}

fn main() {
    let args = Args::parse();

    if let Err(err) = run(args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
