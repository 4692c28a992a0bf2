use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use songpin_server::member::MemberManager;
use songpin_server::store::MemberId;
use songpin_server::SongPinStore;

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SongPin SQLite database file.
    #[clap(value_parser = parse_path)]
    pub path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creates a member with the given handle, nickname and password.
    AddMember {
        handle: String,
        nickname: String,
        password: String,
    },

    /// Replaces the password of a member.
    SetPassword { handle: String, password: String },

    /// Verifies the password of a member without issuing any token.
    CheckPassword { handle: String, password: String },

    /// Shows a member.
    Show { handle: String },

    /// Shows all member handles.
    Handles,

    /// Deletes a member together with their pins and playlists.
    DeleteMember { handle: String },
}

fn find_member_id(manager: &MemberManager, handle: &str) -> Result<MemberId> {
    match manager.find_member_by_handle(handle)? {
        Some(member) => Ok(member.id),
        None => bail!("No member with handle {}", handle),
    }
}

fn execute_command(command: Command, manager: &MemberManager) -> Result<()> {
    match command {
        Command::AddMember {
            handle,
            nickname,
            password,
        } => {
            let id = manager.signup(&handle, &nickname, &password)?;
            println!("Created member {} with id {}", handle, id);
        }
        Command::SetPassword { handle, password } => {
            let id = find_member_id(manager, &handle)?;
            manager.set_password(id, &password)?;
            println!("Password updated for {}", handle);
        }
        Command::CheckPassword { handle, password } => {
            match manager.verify_login(&handle, &password)? {
                Some(_) => println!("Password is correct."),
                None => println!("Password is NOT correct."),
            }
        }
        Command::Show { handle } => match manager.find_member_by_handle(&handle)? {
            Some(member) => println!("{:#?}", member),
            None => bail!("No member with handle {}", handle),
        },
        Command::Handles => {
            for handle in manager.get_all_handles()? {
                println!("{}", handle);
            }
        }
        Command::DeleteMember { handle } => {
            let id = find_member_id(manager, &handle)?;
            manager.delete_member(id)?;
            println!("Deleted member {}", handle);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    let store = SongPinStore::new(&cli_args.path)
        .with_context(|| format!("Could not open database {:?}", cli_args.path))?;
    let manager = MemberManager::new(store);
    execute_command(cli_args.command, &manager)
}
