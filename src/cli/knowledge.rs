use anyhow::{Result, bail};
use console::style;
use std::path::Path;

use super::{Context, parse_args};
use crate::core::knowledge::{
    FileUpload, KnowledgeBaseItem, KnowledgeBaseService, UpdateKnowledgeRequest,
    format_file_size, validate_file,
};
use crate::core::store::KnowledgeBaseStore;
use crate::core::terminal::{GuideSection, print_error, print_success};

const VALUE_FLAGS: &[&str] = &["--title", "--description", "--content", "--mime"];

fn print_usage() {
    GuideSection::new("bankops kb")
        .command("list", "List knowledge entries")
        .command("add", "--title T --content TEXT")
        .command("upload", "<file> [--title T] [--description D] [--mime TYPE]")
        .command("update", "<id> [--title T] [--description D]")
        .command("delete", "<id>")
        .command("show", "<id>  Print the entry's content")
        .command("check", "<file> [--mime TYPE]  Validate without uploading")
        .blank()
        .text("Uploads: PDF, Word, TXT, CSV, Excel, JSON, XML, Markdown, RTF up to 10 MB.")
        .print();
}

fn print_item(item: &KnowledgeBaseItem) {
    let kind = match (&item.file_name, item.is_file()) {
        (Some(name), true) => {
            let size = item
                .metadata
                .size
                .map(format_file_size)
                .unwrap_or_else(|| "?".to_string());
            format!("file {} ({})", name, size)
        }
        _ => "text".to_string(),
    };
    println!(
        "  {} {}  {}",
        style("→").cyan(),
        style(&item.title).white().bold(),
        style(kind).dim()
    );
    println!(
        "      id: {}  updated: {}",
        style(&item.id).dim(),
        item.updated_at.format("%Y-%m-%d %H:%M UTC")
    );
}

async fn load_upload(path: &str, mime: Option<&str>) -> Result<FileUpload> {
    let mut upload = FileUpload::from_path(Path::new(path))
        .await
        .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path, e))?;
    if let Some(mime) = mime {
        upload.mime_type = mime.trim().to_string();
    }
    Ok(upload)
}

pub async fn run(ctx: &Context, args: &[String]) -> Result<()> {
    let sub_cmd = args.first().map(String::as_str).unwrap_or("");
    let parsed = parse_args(args.get(1..).unwrap_or_default(), VALUE_FLAGS);
    let service = KnowledgeBaseService::new(ctx.api.clone());
    let mut store = KnowledgeBaseStore::new(service.clone(), ctx.config.reconcile);

    match sub_cmd {
        "list" | "ls" => {
            store.fetch_items().await?;
            if ctx.json {
                return ctx.print_json(store.items());
            }
            if store.items().is_empty() {
                println!("  {} Knowledge base is empty.", style("●").dim());
                return Ok(());
            }
            println!("\n  {} Knowledge base:\n", style("●").cyan());
            for item in store.items() {
                print_item(item);
            }
            println!();
        }
        "add" => {
            let title = parsed.value("--title").unwrap_or_default();
            let content = parsed
                .value("--content")
                .or_else(|| parsed.positional(0))
                .unwrap_or_default();
            let item = store.add_text_knowledge(title, content).await?;
            if ctx.json {
                return ctx.print_json(&item);
            }
            print_success(&format!("Added '{}' (id: {}).", item.title, item.id));
        }
        "upload" => {
            let Some(path) = parsed.positional(0) else {
                bail!("Usage: bankops kb upload <file> [--title T] [--description D]");
            };
            let upload = load_upload(path, parsed.value("--mime")).await?;

            let mut progress = store.subscribe_progress();
            let reporter = tokio::spawn(async move {
                while progress.changed().await.is_ok() {
                    let p = *progress.borrow_and_update();
                    eprint!(
                        "\r  uploading {:>3}%  {} / {}   ",
                        p.percent(),
                        format_file_size(p.sent),
                        format_file_size(p.total)
                    );
                    if p.done {
                        eprintln!();
                        break;
                    }
                }
            });

            let result = store
                .upload_file_knowledge(
                    &upload,
                    parsed.value("--title").unwrap_or_default(),
                    parsed.value("--description").unwrap_or_default(),
                )
                .await;
            if result.is_ok() {
                reporter.await.ok();
            } else {
                reporter.abort();
                eprintln!();
            }

            let item = result?;
            if ctx.json {
                return ctx.print_json(&item);
            }
            print_success(&format!(
                "Uploaded '{}' ({}) as '{}' (id: {}).",
                upload.file_name,
                format_file_size(upload.size()),
                item.title,
                item.id
            ));
        }
        "update" => {
            let Some(id) = parsed.positional(0) else {
                bail!("Usage: bankops kb update <id> [--title T] [--description D]");
            };
            let patch = UpdateKnowledgeRequest {
                title: parsed.value("--title").map(str::to_string),
                description: parsed.value("--description").map(str::to_string),
            };
            let item = store.update_knowledge_item(id, &patch).await?;
            if ctx.json {
                return ctx.print_json(&item);
            }
            print_success(&format!("Updated '{}'.", item.id));
        }
        "delete" | "rm" => {
            let Some(id) = parsed.positional(0) else {
                bail!("Usage: bankops kb delete <id>");
            };
            store.delete_knowledge_item(id).await?;
            print_success(&format!("Deleted '{}'.", id));
        }
        "show" | "cat" => {
            let Some(id) = parsed.positional(0) else {
                bail!("Usage: bankops kb show <id>");
            };
            println!("{}", service.content(id).await?);
        }
        "check" => {
            let Some(path) = parsed.positional(0) else {
                bail!("Usage: bankops kb check <file>");
            };
            let upload = load_upload(path, parsed.value("--mime")).await?;
            let validation = validate_file(upload.size(), &upload.mime_type);
            if ctx.json {
                return ctx.print_json(&validation);
            }
            GuideSection::new(&upload.file_name)
                .status("Type", &upload.mime_type)
                .status("Size", &format_file_size(upload.size()))
                .print();
            match validation.error {
                None => print_success("File can be uploaded."),
                Some(reason) => print_error(&reason),
            }
        }
        _ => print_usage(),
    }

    Ok(())
}
