use crate::runtime::error::{ErrorListener, RecognitionError};
use crate::runtime::token::Token;
use crate::runtime::tree::{ContextId, ParseTree, ParseTreeListener, TerminalNode};

/// Records every parse-listener callback as a short string:
/// `enter:<rule>`, `exit:<rule>`, `t:<text>` and `err:<text>`.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    pub events: Vec<String>,
    rule_names: Vec<String>,
}

impl EventRecorder {
    pub fn new<S: AsRef<str>>(rule_names: &[S]) -> Self {
        EventRecorder {
            events: Vec::new(),
            rule_names: rule_names.iter().map(|n| n.as_ref().to_string()).collect(),
        }
    }

    fn name(&self, tree: &ParseTree, ctx: ContextId) -> String {
        let rule = tree[ctx].rule_index;
        self.rule_names
            .get(rule)
            .cloned()
            .unwrap_or_else(|| rule.to_string())
    }
}

impl ParseTreeListener for EventRecorder {
    fn visit_terminal(&mut self, node: &TerminalNode) {
        self.events.push(format!("t:{node}"));
    }

    fn visit_error_node(&mut self, node: &TerminalNode) {
        self.events.push(format!("err:{node}"));
    }

    fn enter_every_rule(&mut self, tree: &ParseTree, ctx: ContextId) {
        let name = self.name(tree, ctx);
        self.events.push(format!("enter:{name}"));
    }

    fn exit_every_rule(&mut self, tree: &ParseTree, ctx: ContextId) {
        let name = self.name(tree, ctx);
        self.events.push(format!("exit:{name}"));
    }
}

/// Keeps `line:column msg` for every reported syntax error.
#[derive(Debug, Clone, Default)]
pub struct CollectingErrorListener {
    pub messages: Vec<String>,
}

impl ErrorListener for CollectingErrorListener {
    fn syntax_error(
        &mut self,
        _offending: Option<&Token>,
        line: u32,
        column: u32,
        msg: &str,
        _error: Option<&RecognitionError>,
    ) {
        self.messages.push(format!("{line}:{column} {msg}"));
    }
}
