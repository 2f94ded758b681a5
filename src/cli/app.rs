//! CLI module for the notebook application
//!
//! This module handles the command-line interface for interacting with a
//! notebook session.
use std::{
    fs::{read_to_string, write, OpenOptions},
    io::{stdin, stdout, Write},
    path::Path,
    process::Command,
    sync::Arc,
};

use log::{debug, info};
use shell_words::split;
use tempfile::Builder;
use tokio::{sync::Mutex, time::Duration};

use crate::{
    export, load_notes_from_file, parse_reminder_time, parse_tags, sync::DirectoryRemote, Commands,
    Config, ExportFormat, FolderAction, Note, NotebookError, Notebook, ReminderScheduler, Result,
    SortKey, SyncDirection, TAG_COLORS,
};

/// CLI Application handler - processes CLI commands against a Notebook
pub struct App {
    /// The open notebook session
    notebook: Notebook,

    /// Application configuration
    config: Config,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    /// Create a new CLI application with the given notebook and config
    pub fn new(notebook: Notebook, config: Config, verbose: bool) -> Self {
        Self {
            notebook,
            config,
            verbose,
        }
    }

    /// Run the CLI application with the given command
    pub async fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Create {
                title,
                content,
                edit,
                tags,
                folder,
            } => self.create_note(title, content, edit, tags, folder)?,

            Commands::View { id, json } => self.view_note(&id, json)?,

            Commands::List {
                query,
                tag,
                folder,
                sort,
                json,
            } => self.list_notes(query, tag, folder, sort, json)?,

            Commands::Edit {
                id,
                title,
                content,
                edit,
            } => self.handle_edit(&id, title, content, edit)?,

            Commands::Delete { id, force } => self.handle_delete(&id, force)?,

            Commands::Tag {
                id,
                add,
                color,
                remove,
            } => self.handle_tags(&id, add, color, remove)?,

            Commands::Pin { id } => {
                let note = self.require(&id)?;
                let note = self.notebook.toggle_pin(&note.id).unwrap_or(note);
                println!(
                    "Note '{}' is now {}",
                    note.title,
                    if note.pinned { "pinned" } else { "unpinned" }
                );
            }

            Commands::Remind { id, at, clear } => self.handle_remind(&id, at, clear)?,

            Commands::Folder { action } => self.handle_folder(action)?,

            Commands::Move { id, folder } => self.handle_move(&id, folder)?,

            Commands::Export { output, format, id } => {
                self.handle_export(&output, format, id.as_deref())?
            }

            Commands::Import { source } => {
                let notes = load_notes_from_file(&source)?;
                let total = notes.len();
                let added = self.notebook.import_notes(notes);
                println!(
                    "Imported {} of {} notes ({} already present)",
                    added,
                    total,
                    total - added
                );
            }

            Commands::Sync { direction } => self.handle_sync(direction)?,

            Commands::Lock { password } => {
                self.notebook.set_password(&password)?;
                println!("Notes are now stored encrypted");
            }

            Commands::Unlock { .. } => {
                self.notebook.remove_password()?;
                println!("Notes are now stored unencrypted");
            }

            Commands::Watch => self.watch_reminders().await?,

            Commands::Stats { id } => {
                let note = self.require(&id)?;
                let stats = export::text_stats(&note.content);
                println!("Characters: {}", stats.chars);
                println!("Words: {}", stats.words);
            }
        }

        Ok(())
    }

    fn require(&self, id: &str) -> Result<Note> {
        self.notebook
            .note(id)
            .cloned()
            .ok_or_else(|| NotebookError::NoteNotFound { id: id.to_string() })
    }

    fn folder_id(&self, name: &str) -> Result<String> {
        self.notebook
            .store()
            .folder_by_name(name)
            .map(|f| f.id.clone())
            .ok_or_else(|| NotebookError::FolderNotFound {
                name: name.to_string(),
            })
    }

    fn create_note(
        &mut self,
        title: Option<String>,
        content: Option<String>,
        open_editor: bool,
        tags: Option<String>,
        folder: Option<String>,
    ) -> Result<()> {
        let folder_id = folder.map(|name| self.folder_id(&name)).transpose()?;

        let mut note = self.notebook.create_note();
        if let Some(title) = title {
            note = self.notebook.rename_note(&note.id, &title).unwrap_or(note);
        }

        let content = match content {
            Some(c) => Some(c),
            None if open_editor => Some(self.open_editor_with_content(&note.title, "")?),
            None => None,
        };
        if let Some(content) = content {
            self.notebook.edit_content(&note.id, &content);
        }

        for tag in parse_tags(tags) {
            self.notebook.add_tag(&note.id, &tag, TAG_COLORS[0]);
        }
        if let Some(folder_id) = folder_id {
            self.notebook.move_to_folder(&note.id, Some(&folder_id));
        }

        println!("Note created with ID: {}", note.id);
        Ok(())
    }

    fn view_note(&self, id: &str, json: bool) -> Result<()> {
        let note = self.require(id)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&note)?);
            return Ok(());
        }

        self.print_note_header(&note);
        if let Some(folder) = note
            .folder_id
            .as_deref()
            .and_then(|id| self.notebook.store().folder(id))
        {
            println!("Folder: {}", folder.name);
        }
        if let Some(at) = note.reminder {
            println!("Reminder: {}", at.format("%Y-%m-%d %H:%M UTC"));
        }
        println!("\n{}", note.content);
        Ok(())
    }

    /// List notes according to provided filters and options
    fn list_notes(
        &self,
        query: Option<String>,
        tag: Option<String>,
        folder: Option<String>,
        sort: SortKey,
        json: bool,
    ) -> Result<()> {
        let mut notes =
            self.notebook
                .visible(query.as_deref().unwrap_or(""), tag.as_deref(), sort);

        if let Some(name) = folder {
            let folder_id = self.folder_id(&name)?;
            notes.retain(|n| n.folder_id.as_deref() == Some(folder_id.as_str()));
        }
        debug!("Listing {} notes sorted by {}", notes.len(), sort);

        if json {
            println!("{}", export::notes_to_json(&notes)?);
            return Ok(());
        }

        if notes.is_empty() {
            println!("No notes found matching the criteria.");
            return Ok(());
        }

        for (i, note) in notes.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(50));
            }
            self.print_note_header(note);

            let preview = get_content_preview(&note.content, 100);
            if !preview.is_empty() {
                println!("\n{}", preview);
            }
        }

        println!(
            "\nFound {} note{}",
            notes.len(),
            if notes.len() == 1 { "" } else { "s" }
        );
        Ok(())
    }

    fn print_note_header(&self, note: &Note) {
        let marker = if note.pinned {
            console::style("[pinned] ").yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "ID: {} | Updated: {}",
            note.id,
            note.updated_at.format("%Y-%m-%d %H:%M")
        );
        println!("Title: {}{}", marker, console::style(&note.title).bold());

        if !note.tags.is_empty() {
            let tags = note
                .tags
                .iter()
                .map(|tag| format!("#{}", tag.name))
                .collect::<Vec<_>>()
                .join(" ");
            println!("Tags: {}", console::style(tags).cyan());
        }

        if self.verbose {
            println!("Created: {}", note.created_at.format("%Y-%m-%d %H:%M"));
        }
    }

    fn handle_edit(
        &mut self,
        id: &str,
        title: Option<String>,
        content: Option<String>,
        open_editor: bool,
    ) -> Result<()> {
        if content.is_some() && open_editor {
            return Err(NotebookError::ApplicationError {
                message: "Cannot specify both --content and --edit options".to_string(),
            });
        }

        let note = self.require(id)?;

        if let Some(title) = title {
            self.notebook.rename_note(id, &title);
        }

        let content = match content {
            Some(c) => Some(c),
            None if open_editor => Some(self.open_editor_with_content(&note.title, &note.content)?),
            None => None,
        };
        if let Some(content) = content {
            self.notebook.edit_content(id, &content);
        }

        println!("Note {} updated successfully", id);
        Ok(())
    }

    fn handle_delete(&mut self, id: &str, force: bool) -> Result<()> {
        let note = self.require(id)?;

        if !force {
            println!("You are about to delete the following note:");
            println!("ID:     {}", note.id);
            println!("Title:  {}", note.title);

            println!("\nThis action cannot be undone!");
            print!("Are you sure you want to delete this note? [y/N]: ");
            stdout().flush()?;

            let mut input = String::new();
            stdin().read_line(&mut input)?;

            let input = input.trim().to_lowercase();
            if input != "y" && input != "yes" {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        self.notebook.delete_note(id);
        println!(
            "Note '{}' ({}) has been permanently deleted.",
            note.title, note.id
        );
        Ok(())
    }

    fn handle_tags(
        &mut self,
        id: &str,
        add: Option<String>,
        color: Option<String>,
        remove: Option<String>,
    ) -> Result<()> {
        self.require(id)?;
        let color = color.unwrap_or_else(|| TAG_COLORS[0].to_string());

        for tag in parse_tags(add) {
            self.notebook.add_tag(id, &tag, &color);
        }
        for tag in parse_tags(remove) {
            self.notebook.remove_tag(id, &tag);
        }

        let note = self.require(id)?;
        if note.tags.is_empty() {
            println!("Note {} has no tags", id);
        } else {
            for tag in &note.tags {
                println!("#{} ({})", tag.name, tag.color);
            }
        }
        Ok(())
    }

    fn handle_remind(&mut self, id: &str, at: Option<String>, clear: bool) -> Result<()> {
        self.require(id)?;
        match (at, clear) {
            (Some(_), true) => Err(NotebookError::ApplicationError {
                message: "Cannot specify both --at and --clear".to_string(),
            }),
            (Some(at), false) => {
                let at = parse_reminder_time(&at)?;
                self.notebook.set_reminder(id, at);
                println!("Reminder set for {}", at.format("%Y-%m-%d %H:%M UTC"));
                Ok(())
            }
            (None, true) => {
                self.notebook.clear_reminder(id);
                println!("Reminder cleared");
                Ok(())
            }
            (None, false) => {
                match self.require(id)?.reminder {
                    Some(at) => println!("Reminder: {}", at.format("%Y-%m-%d %H:%M UTC")),
                    None => println!("No reminder set"),
                }
                Ok(())
            }
        }
    }

    fn handle_folder(&mut self, action: FolderAction) -> Result<()> {
        match action {
            FolderAction::Add { name } => match self.notebook.create_folder(&name) {
                Some(folder) => println!("Folder '{}' created", folder.name),
                None => println!("Folder name is empty or already used: '{}'", name.trim()),
            },
            FolderAction::Remove { name } => {
                let folder_id = self.folder_id(&name)?;
                self.notebook.delete_folder(&folder_id);
                println!("Folder '{}' deleted; its notes are now unfiled", name);
            }
            FolderAction::List => {
                let store = self.notebook.store();
                for folder in store.folders() {
                    let count = store.notes_in_folder(Some(&folder.id)).len();
                    println!("{} ({} notes)", folder.name, count);
                }
                println!("Unfiled ({} notes)", store.notes_in_folder(None).len());
            }
        }
        Ok(())
    }

    fn handle_move(&mut self, id: &str, folder: Option<String>) -> Result<()> {
        self.require(id)?;
        let folder_id = folder.as_deref().map(|name| self.folder_id(name)).transpose()?;
        self.notebook.move_to_folder(id, folder_id.as_deref());
        match folder {
            Some(name) => println!("Note {} moved to '{}'", id, name),
            None => println!("Note {} is now unfiled", id),
        }
        Ok(())
    }

    fn handle_export(&self, output: &Path, format: ExportFormat, id: Option<&str>) -> Result<()> {
        let notes: Vec<Note> = match id {
            Some(id) => vec![self.require(id)?],
            None => self.notebook.notes().to_vec(),
        };

        let document = match (format, notes.as_slice()) {
            (ExportFormat::Json, notes) => export::notes_to_json(notes)?,
            (ExportFormat::Markdown, [note]) if id.is_some() => export::note_to_markdown(note),
            (ExportFormat::Markdown, notes) => export::notes_to_markdown(notes),
            (ExportFormat::Html, [note]) if id.is_some() => export::note_to_html(note),
            (ExportFormat::Ics, [note]) if id.is_some() => export::reminder_to_ics(note)
                .ok_or_else(|| NotebookError::ApplicationError {
                    message: format!("Note {} has no reminder", note.id),
                })?,
            (ExportFormat::Html | ExportFormat::Ics, _) => {
                return Err(NotebookError::ApplicationError {
                    message: "HTML and calendar exports need a single note (--id)".to_string(),
                })
            }
        };

        let output = if output.is_dir() {
            let file_name = match (format, notes.as_slice()) {
                (ExportFormat::Json, _) => "notes.json".to_string(),
                (ExportFormat::Markdown, [note]) if id.is_some() => {
                    export::export_file_name(&note.title, "note", "md")
                }
                (ExportFormat::Markdown, _) => "notes.md".to_string(),
                (ExportFormat::Html, [note]) => {
                    export::export_file_name(&note.title, "note", "html")
                }
                (ExportFormat::Ics, [note]) => {
                    export::export_file_name(&note.title, "reminder", "ics")
                }
                _ => "export".to_string(),
            };
            output.join(file_name)
        } else {
            output.to_path_buf()
        };

        write(&output, document)?;
        info!("Exported {} notes to {}", notes.len(), output.display());
        println!("Exported to {}", output.display());
        Ok(())
    }

    fn handle_sync(&mut self, direction: SyncDirection) -> Result<()> {
        let sync_dir = self
            .config
            .sync_dir
            .clone()
            .ok_or_else(|| NotebookError::ConfigError {
                message: "No sync directory configured (use --sync-dir)".to_string(),
            })?;
        let mut remote = DirectoryRemote::new(sync_dir);
        debug!("Syncing with {}", remote.root().display());

        let status = match direction {
            SyncDirection::Push => self.notebook.push_to(&mut remote),
            SyncDirection::Pull => self.notebook.pull_from(&remote),
        };

        println!("{}", status.message());
        if status.is_success() {
            Ok(())
        } else {
            Err(NotebookError::Sync {
                message: status.message(),
            })
        }
    }

    async fn watch_reminders(&mut self) -> Result<()> {
        let store = Arc::new(Mutex::new(self.notebook.store().clone()));
        let mut scheduler = ReminderScheduler::new(
            store,
            Duration::from_secs(self.config.reminder_check_secs.max(1)),
        );
        let mut due_rx = scheduler.start()?;
        println!("Watching reminders, press Ctrl-C to stop");

        loop {
            tokio::select! {
                reminder = due_rx.recv() => match reminder {
                    Some(reminder) => println!(
                        "{} {} ({})",
                        console::style("Reminder:").yellow().bold(),
                        reminder.title,
                        reminder.at.format("%Y-%m-%d %H:%M UTC")
                    ),
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        scheduler.stop().await
    }

    // Helper function to open editor with existing content
    fn open_editor_with_content(&self, title: &str, existing_content: &str) -> Result<String> {
        let temp_file = Builder::new().suffix(".md").tempfile()?;
        let temp_path = temp_file.path().to_path_buf();

        {
            let mut file = OpenOptions::new().write(true).open(&temp_path)?;
            writeln!(file, "<!-- Editing: {} -->", title)?;
            writeln!(
                file,
                "<!-- Lines that start with <!-- and end with --> are ignored. -->"
            )?;
            write!(file, "{}", existing_content)?;
        }

        let editor_cmd = self.config.get_editor_command();
        info!("Opening editor to write note content. Save and exit when done...");
        launch_editor(&editor_cmd, &temp_path)?;

        let content = read_to_string(&temp_path)?;
        Ok(process_editor_content(&content))
    }
}

fn launch_editor(editor_cmd: &str, file_path: &Path) -> Result<()> {
    let args = split(editor_cmd).map_err(|e| NotebookError::EditorError {
        message: format!("Failed to parse editor command: {}", e),
    })?;

    let Some((program, rest)) = args.split_first() else {
        return Err(NotebookError::EditorError {
            message: "Empty editor command".to_string(),
        });
    };

    let status = Command::new(program).args(rest).arg(file_path).status()?;

    if !status.success() {
        return Err(NotebookError::EditorError {
            message: "Editor exited with non-zero status".to_string(),
        });
    }

    Ok(())
}

/// Drops the editor's comment lines
fn process_editor_content(content: &str) -> String {
    content
        .lines()
        .filter(|line| !(line.trim_start().starts_with("<!--") && line.trim_end().ends_with("-->")))
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Generate a content preview for displaying brief notes
fn get_content_preview(content: &str, max_chars: usize) -> String {
    let first_line = content
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");

    if first_line.chars().count() <= max_chars {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_comments_are_stripped() {
        let raw = "<!-- Editing: x -->\nline one\n<!-- note -->\nline two";
        assert_eq!(process_editor_content(raw), "line one\nline two");
    }

    #[test]
    fn preview_uses_first_non_empty_line() {
        assert_eq!(get_content_preview("\n\n  \nhello\nworld", 100), "hello");
        assert_eq!(get_content_preview("ééééé", 3), "ééé...");
        assert_eq!(get_content_preview("", 3), "");
    }
}
