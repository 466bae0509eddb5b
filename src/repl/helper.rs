use std::borrow::Cow::{self, Borrowed, Owned};

use anyhow::Result;
use rustyline::{
    highlight::{Highlighter, MatchingBracketHighlighter},
    hint::HistoryHinter,
    history::FileHistory,
    validate::MatchingBracketValidator,
    Completer, Config, Editor, Helper, Hinter, Validator,
};

use super::completer::MyCompleter;
use crate::abi::MethodIndex;

#[derive(Helper, Completer, Hinter, Validator)]
pub(crate) struct MyHelper {
    #[rustyline(Completer)]
    completer: MyCompleter,
    highlighter: MatchingBracketHighlighter,
    #[rustyline(Validator)]
    validator: MatchingBracketValidator,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    colored_prompt: String,
}

impl MyHelper {
    pub fn new(index: &MethodIndex) -> Self {
        MyHelper {
            completer: MyCompleter::new(index),
            highlighter: MatchingBracketHighlighter::new(),
            validator: MatchingBracketValidator::new(),
            hinter: HistoryHinter::new(),
            colored_prompt: ">> ".to_owned(),
        }
    }

    pub fn set_prompt(&mut self, prompt: &str) {
        self.colored_prompt = prompt.to_owned();
    }
}

impl Highlighter for MyHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Borrowed(&self.colored_prompt)
        } else {
            Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned("\x1b[1m".to_owned() + hint + "\x1b[m")
    }

    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_char(&self, line: &str, pos: usize, forced: bool) -> bool {
        self.highlighter.highlight_char(line, pos, forced)
    }
}

pub(crate) fn create_editor(index: &MethodIndex) -> Result<Editor<MyHelper, FileHistory>> {
    let config = Config::builder()
        .completion_type(rustyline::CompletionType::List)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<MyHelper, FileHistory> = Editor::with_config(config)?;
    rl.set_helper(Some(MyHelper::new(index)));
    Ok(rl)
}
