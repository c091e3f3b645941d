use std::cell::Cell;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cli::{LlmArgs, MergeMode, SectionsArgs};
use crate::reconstruct::ends_sentence;
use crate::util::{write_json_pretty, write_lines};

mod grouping;
mod html_input;
mod llm;
mod locate;
mod output;
mod patterns;
mod run;
#[cfg(test)]
mod tests;
mod tree;

pub use run::run;

use grouping::*;
use html_input::*;
use llm::*;
use locate::*;
use output::*;
use patterns::*;
use tree::*;
