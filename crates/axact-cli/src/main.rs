/*!
axact - command-line driver for element-targeted desktop automation.

```text
# Find a button by text in a running app
axact find --text "Save" --role button --app TextEdit

# Click it (scrolling it into view if needed)
axact click --text "Save" --role button

# Re-target by stable reference
axact click "@ref:Button-2-Toolbar"

# Type into a field
axact type "hello world" --role textfield --app Safari

# Page down under the pointer target
axact scroll --direction down --pages 1 --at 500,300
```
*/

use anyhow::{bail, Context, Result};
use axact::{
  ClickOptions, Desktop, DragMode, Driver, Element, ElementQuery, ElementReference, Point,
  ScrollAmount, ScrollDirection, ScrollTarget,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "axact")]
#[command(author, version, about = "Element-targeted desktop UI automation", long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

/// Element selection flags shared by element-targeted subcommands. A
/// positional `@…` reference replaces them.
#[derive(Args, Debug, Default)]
struct QueryArgs {
  /// Stable element reference (`@id:…`, `@ref:…`, `@pos:…`)
  #[arg(value_name = "REF")]
  reference: Option<String>,

  /// Visible text (title, description, or value; fuzzy by default)
  #[arg(long, short)]
  text: Option<String>,

  /// Role, long or short form ("AXButton" or "button")
  #[arg(long, short)]
  role: Option<String>,

  /// Scope to one running application by name
  #[arg(long, short)]
  app: Option<String>,

  /// Accessibility identifier
  #[arg(long)]
  id: Option<String>,

  /// Sibling index among the parent's children
  #[arg(long)]
  index: Option<usize>,

  /// Parent role
  #[arg(long)]
  parent_role: Option<String>,

  #[arg(long)]
  min_width: Option<f64>,
  #[arg(long)]
  max_width: Option<f64>,
  #[arg(long)]
  min_height: Option<f64>,
  #[arg(long)]
  max_height: Option<f64>,

  /// Require exact substring matches (disable fuzzy subsequences)
  #[arg(long)]
  exact: bool,

  /// Maximum matches (0 = unlimited)
  #[arg(long, default_value_t = 0)]
  limit: usize,

  /// Traversal depth bound
  #[arg(long, default_value_t = 40)]
  depth: usize,
}

impl QueryArgs {
  fn to_query(&self) -> Result<ElementQuery> {
    if let Some(reference) = &self.reference {
      let parsed = ElementReference::parse(reference)
        .with_context(|| format!("bad reference '{reference}'"))?;
      let mut query = parsed.to_query();
      if let Some(app) = &self.app {
        query.application = Some(app.clone());
      }
      return Ok(query);
    }

    let mut query = ElementQuery::new();
    query.text = self.text.clone();
    query.role = self.role.clone();
    query.application = self.app.clone();
    query.identifier = self.id.clone();
    query.sibling_index = self.index;
    query.parent_role = self.parent_role.clone();
    query.min_width = self.min_width;
    query.max_width = self.max_width;
    query.min_height = self.min_height;
    query.max_height = self.max_height;
    query.fuzzy_match = !self.exact;
    query.limit = self.limit;
    query.max_depth = self.depth;

    // An unconstrained query would return every element on screen; make
    // the caller say what they want.
    if query.is_unconstrained() && query.application.is_none() {
      bail!("refusing an empty query: give at least one of --text/--role/--id/--index/--parent-role/--app or a @reference");
    }
    Ok(query)
  }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Direction {
  Up,
  Down,
  Left,
  Right,
}

impl From<Direction> for ScrollDirection {
  fn from(direction: Direction) -> Self {
    match direction {
      Direction::Up => Self::Up,
      Direction::Down => Self::Down,
      Direction::Left => Self::Left,
      Direction::Right => Self::Right,
    }
  }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Button {
  Left,
  Right,
  Middle,
}

impl From<Button> for axact::input::MouseButton {
  fn from(button: Button) -> Self {
    match button {
      Button::Left => Self::Left,
      Button::Right => Self::Right,
      Button::Middle => Self::Middle,
    }
  }
}

#[derive(Subcommand)]
enum Command {
  /// List running applications
  Apps,

  /// Find elements matching a query
  Find(QueryArgs),

  /// Click an element
  Click {
    #[command(flatten)]
    query: QueryArgs,

    /// Warp straight to the target instead of tracing a humanized path
    #[arg(long)]
    direct: bool,

    /// Do not scroll off-screen targets into view first
    #[arg(long)]
    no_scroll: bool,

    #[arg(long, value_enum, default_value_t = Button::Left)]
    button: Button,
  },

  /// Type text into an element
  Type {
    /// Text to type
    text: String,

    #[command(flatten)]
    query: QueryArgs,
  },

  /// Read an element's current text
  Read(QueryArgs),

  /// Describe the element at a screen position
  At { x: f64, y: f64 },

  /// Describe the focused element
  Focused,

  /// Scroll the element matching a query fully into view
  ScrollTo(QueryArgs),

  /// Post a scroll at a point or over an element's scroll container
  Scroll {
    #[arg(long, value_enum)]
    direction: Direction,

    /// Pages to scroll (90% of the viewport each)
    #[arg(long, conflicts_with = "pixels")]
    pages: Option<f64>,

    /// Pixels to scroll
    #[arg(long)]
    pixels: Option<f64>,

    /// Literal target point "x,y" (otherwise the query's element container)
    #[arg(long, value_parser = parse_point, conflicts_with_all = ["text", "role", "id", "reference"])]
    at: Option<Point>,

    #[command(flatten)]
    query: QueryArgs,
  },

  /// Drag from one point to another
  Drag {
    #[arg(long, value_parser = parse_point)]
    from: Point,

    #[arg(long, value_parser = parse_point)]
    to: Point,

    /// Interpolate over this many milliseconds at ~60 Hz
    #[arg(long, conflicts_with = "humanize")]
    duration_ms: Option<u64>,

    /// Trace a humanized trajectory
    #[arg(long)]
    humanize: bool,
  },

  /// Move the pointer
  Move {
    #[arg(long, value_parser = parse_point)]
    to: Point,

    #[arg(long)]
    humanize: bool,

    /// Assumed target width for movement timing
    #[arg(long, default_value_t = 10.0)]
    width: f64,
  },
}

fn parse_point(input: &str) -> std::result::Result<Point, String> {
  let (x, y) = input
    .split_once(',')
    .ok_or_else(|| format!("expected \"x,y\", got '{input}'"))?;
  let parse = |s: &str| {
    s.trim()
      .parse::<f64>()
      .map_err(|_| format!("bad coordinate '{s}'"))
  };
  Ok(Point::new(parse(x)?, parse(y)?))
}

fn system_driver() -> Result<Driver> {
  #[cfg(target_os = "macos")]
  {
    Ok(Driver::system()?)
  }
  #[cfg(not(target_os = "macos"))]
  {
    bail!("axact drives the macOS accessibility and input APIs; this platform is unsupported")
  }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

fn resolve(driver: &Driver, args: &QueryArgs) -> Result<Element> {
  let query = args.to_query()?;
  Ok(driver.find_first(&query)?)
}

async fn run(cli: Cli) -> Result<()> {
  let driver = system_driver()?;

  match cli.command {
    Command::Apps => {
      print_json(&driver.desktop().applications())?;
    }

    Command::Find(args) => {
      let query = args.to_query()?;
      let result = driver.find(&query)?;
      log::info!(
        "matched {} of {} nodes in {}ms",
        result.elements.len(),
        result.searched_count,
        result.duration_ms
      );
      print_json(&result)?;
    }

    Command::Click {
      query,
      direct,
      no_scroll,
      button,
    } => {
      let element = resolve(&driver, &query)?;
      let clicked = driver
        .click(
          &element,
          ClickOptions {
            button: button.into(),
            humanize: !direct,
            auto_scroll: !no_scroll,
          },
        )
        .await?;
      print_json(&clicked)?;
    }

    Command::Type { text, query } => {
      let element = resolve(&driver, &query)?;
      driver.type_text(&element, &text).await?;
      print_json(&driver.read(&element)?)?;
    }

    Command::Read(args) => {
      let element = resolve(&driver, &args)?;
      print_json(&driver.read(&element)?)?;
    }

    Command::At { x, y } => {
      let handle = driver
        .desktop()
        .element_at(x, y)
        .with_context(|| format!("no element at ({x}, {y})"))?;
      let element =
        axact::materialize(&handle).with_context(|| format!("unreadable element at ({x}, {y})"))?;
      print_json(&element)?;
    }

    Command::Focused => {
      let handle = driver
        .desktop()
        .focused_element()
        .context("no focused element")?;
      let element = axact::materialize(&handle).context("unreadable focused element")?;
      print_json(&element)?;
    }

    Command::ScrollTo(args) => {
      let element = resolve(&driver, &args)?;
      let result = driver.scroll_to_element(&element).await?;
      print_json(&result)?;
    }

    Command::Scroll {
      direction,
      pages,
      pixels,
      at,
      query,
    } => {
      let target = match at {
        Some(point) => ScrollTarget::At(point),
        None => ScrollTarget::Container(resolve(&driver, &query)?),
      };
      let amount = match (pages, pixels) {
        (_, Some(pixels)) => ScrollAmount::Pixels(pixels),
        (Some(pages), None) => ScrollAmount::Pages(pages),
        (None, None) => ScrollAmount::Pages(1.0),
      };
      let outcome = driver.scroll_at(target, direction.into(), amount).await?;
      print_json(&outcome)?;
    }

    Command::Drag {
      from,
      to,
      duration_ms,
      humanize,
    } => {
      let mode = if humanize {
        DragMode::Humanized
      } else if let Some(ms) = duration_ms {
        DragMode::Interpolated {
          duration: Duration::from_millis(ms),
        }
      } else {
        DragMode::Direct
      };
      driver.drag(from, to, mode).await?;
    }

    Command::Move { to, humanize, width } => {
      driver.move_pointer(to, humanize, width).await?;
    }
  }

  Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  env_logger::init();
  run(Cli::parse()).await
}
