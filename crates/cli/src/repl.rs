//! Interactive browsing: a line-oriented shell over the controller.

use crate::render;
use anyhow::Context;
use std::path::PathBuf;
use tracing::debug;
use viewer_core::controller::{GridView, ResultSetController, SubmitOutcome};
use viewer_core::resource::PendingLoad;

pub const HELP: &str = "\
commands:
  search <text>   run a query and show the grid
  open <n>        view result n (numbered from 1)
  next | n        next image, wrapping to the first
  prev | p        previous image, wrapping to the last
  close           leave the viewer
  save <file>     write the viewed image as PNG
  show            redraw
  help            this text
  quit            exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Open(usize),
    Next,
    Previous,
    Close,
    Save(PathBuf),
    Show,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };
        match word {
            "search" | "s" => Ok(Command::Search(rest.to_string())),
            "open" | "o" => rest
                .parse::<usize>()
                .ok()
                .filter(|n| *n >= 1)
                .map(Command::Open)
                .ok_or_else(|| format!("expected a result number, got {:?}", rest)),
            "next" | "n" => Ok(Command::Next),
            "prev" | "previous" | "p" => Ok(Command::Previous),
            "close" | "c" => Ok(Command::Close),
            "save" if !rest.is_empty() => Ok(Command::Save(PathBuf::from(rest))),
            "save" => Err("expected a file name".to_string()),
            "show" | "" => Ok(Command::Show),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(format!("unknown command {:?}; type help", other)),
        }
    }
}

pub enum Reply {
    Text(String),
    Quit,
}

/// Holds the controller plus the grid currently on screen. Replacing or
/// dropping the grid releases its thumbnails.
pub struct Session {
    ctl: ResultSetController,
    grid: Option<GridView>,
}

impl Session {
    pub fn new(ctl: ResultSetController) -> Self {
        Self { ctl, grid: None }
    }

    pub fn controller(&self) -> &ResultSetController {
        &self.ctl
    }

    pub async fn execute(&mut self, cmd: Command) -> anyhow::Result<Reply> {
        debug!(?cmd, "executing");
        let text = match cmd {
            Command::Search(query) => self.search(&query).await?,
            Command::Open(number) => {
                let len = self.ctl.result_set().map(|r| r.len()).unwrap_or(0);
                if number > len {
                    format!("no result #{}", number)
                } else {
                    let load = self.ctl.select_for_viewing(number - 1)?;
                    self.show_viewer(load).await
                }
            }
            Command::Next | Command::Previous if self.ctl.viewer_state().is_none() => {
                "viewer is not open".to_string()
            }
            Command::Next => {
                let load = self.ctl.next()?;
                self.show_viewer(load).await
            }
            Command::Previous => {
                let load = self.ctl.previous()?;
                self.show_viewer(load).await
            }
            Command::Close => {
                self.ctl.close_viewer();
                self.render()
            }
            Command::Save(path) => self.save(path)?,
            Command::Show => self.render(),
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Reply::Quit),
        };
        Ok(Reply::Text(text))
    }

    async fn search(&mut self, query: &str) -> anyhow::Result<String> {
        self.grid = None;
        match self.ctl.submit_query(query).await {
            SubmitOutcome::Applied(_) => {
                self.grid = self.ctl.grid();
                if let Some(grid) = &self.grid {
                    load_thumbnails(grid).await?;
                }
                Ok(self.render())
            }
            SubmitOutcome::Failed(message) => Ok(message),
            SubmitOutcome::Superseded => Ok(String::new()),
        }
    }

    async fn show_viewer(&self, load: PendingLoad) -> String {
        load.await;
        render::render_viewer(&self.ctl).unwrap_or_default()
    }

    fn save(&self, path: PathBuf) -> anyhow::Result<String> {
        let saved = self
            .ctl
            .with_viewer_handle(|handle| handle.save_png(&path))
            .transpose()
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(match saved {
            Some(()) => format!("saved {}", path.display()),
            None => "no image ready in the viewer".to_string(),
        })
    }

    pub fn render(&self) -> String {
        if let Some(viewer) = render::render_viewer(&self.ctl) {
            return viewer;
        }
        let mut out = Vec::new();
        if let Some(banner) = render::render_banner(&self.ctl.snapshot()) {
            out.push(banner);
        }
        if let Some(grid) = &self.grid {
            out.push(render::render_grid(grid));
        }
        out.join("\n")
    }
}

/// Thumbnails settle independently and in any order.
pub async fn load_thumbnails(grid: &GridView) -> anyhow::Result<()> {
    let tasks: Vec<_> = grid.load_all().into_iter().map(tokio::spawn).collect();
    for task in tasks {
        task.await?;
    }
    Ok(())
}
