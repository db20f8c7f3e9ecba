//! Stock tool dispatch table
//!
//! Resolves the tool calls a run asks for. The table is fixed: four function
//! names, each answered locally with a static or echoed value.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::RelayError;
use crate::types::{RunToolCall, ToolOutput};

/// Functions the assistant may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockTool {
    ListStocks,
    ShowStockPrice,
    ShowStockPurchase,
    GetEvents,
}

impl StockTool {
    pub const ALL: [StockTool; 4] = [
        StockTool::ListStocks,
        StockTool::ShowStockPrice,
        StockTool::ShowStockPurchase,
        StockTool::GetEvents,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::ListStocks => "listStocks",
            Self::ShowStockPrice => "showStockPrice",
            Self::ShowStockPurchase => "showStockPurchase",
            Self::GetEvents => "getEvents",
        }
    }

    /// Look up a function name. Unknown names are [`RelayError::UnknownTool`].
    pub fn from_name(name: &str) -> Result<Self, RelayError> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.name() == name)
            .ok_or_else(|| RelayError::UnknownTool(name.to_string()))
    }

    /// Compute this tool's output for the parsed argument object.
    pub fn execute(self, arguments: &Value) -> Result<String, RelayError> {
        match self {
            Self::ListStocks => Ok(serde_json::to_string(&list_stocks())?),
            Self::ShowStockPrice | Self::ShowStockPurchase => {
                symbol_argument(self, arguments).map(str::to_string)
            }
            Self::GetEvents => Ok("news".to_string()),
        }
    }
}

impl std::fmt::Display for StockTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A ticker row returned by `listStocks`.
///
/// Prices and deltas are whole numbers, so they serialize without a
/// fractional part (`"delta":2`, not `"delta":2.0`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub symbol: String,
    pub price: u32,
    pub delta: i32,
}

impl Stock {
    fn new(symbol: &str, price: u32, delta: i32) -> Self {
        Self {
            symbol: symbol.to_string(),
            price,
            delta,
        }
    }
}

pub fn list_stocks() -> Vec<Stock> {
    vec![
        Stock::new("AAPL", 150, 2),
        Stock::new("GOOGL", 2500, -10),
        Stock::new("TSLA", 700, 5),
    ]
}

fn symbol_argument(tool: StockTool, arguments: &Value) -> Result<&str, RelayError> {
    arguments
        .get("symbol")
        .and_then(Value::as_str)
        .ok_or_else(|| RelayError::InvalidToolArguments {
            tool: tool.name().to_string(),
            reason: "expected a string 'symbol' argument".to_string(),
        })
}

fn parse_arguments(call: &RunToolCall) -> Result<Value, RelayError> {
    let raw = call.function.arguments.trim();
    if raw.is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(raw).map_err(|e| RelayError::InvalidToolArguments {
        tool: call.function.name.clone(),
        reason: format!("arguments are not valid JSON: {e}"),
    })
}

/// Resolve one tool call into its output.
pub fn resolve_tool_call(call: &RunToolCall) -> Result<ToolOutput, RelayError> {
    let arguments = parse_arguments(call)?;
    let tool = StockTool::from_name(&call.function.name)?;
    debug!(tool = %tool, tool_call_id = %call.id, "Resolving tool call");
    Ok(ToolOutput {
        tool_call_id: call.id.clone(),
        output: tool.execute(&arguments)?,
    })
}

/// Resolve a whole batch. The first failure aborts the batch, so a partial
/// set of outputs is never produced.
pub fn resolve_tool_calls(calls: &[RunToolCall]) -> Result<Vec<ToolOutput>, RelayError> {
    calls.iter().map(resolve_tool_call).collect()
}
