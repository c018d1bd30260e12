use std::fmt;

use bt_config::ConfigError;
use bt_data::DataError;
use bt_execution::ExecutionError;
use bt_portfolio::PortfolioError;
use bt_strategy::StrategyContractError;

/// Fatal run-level errors. Risk rejections and liquidations are
/// deliberately absent: they're recorded outcomes of a normal run, not
/// failures of the run itself.
#[derive(Debug)]
pub enum EngineError {
    Config(ConfigError),
    Data(DataError),
    StrategyContract(StrategyContractError),
    Execution(ExecutionError),
    Portfolio(PortfolioError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Config(e) => write!(f, "config error: {e}"),
            EngineError::Data(e) => write!(f, "data error: {e}"),
            EngineError::StrategyContract(e) => write!(f, "strategy contract error: {e}"),
            EngineError::Execution(e) => write!(f, "execution error: {e}"),
            EngineError::Portfolio(e) => write!(f, "portfolio error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Config(e) => Some(e),
            EngineError::Data(e) => Some(e),
            EngineError::StrategyContract(e) => Some(e),
            EngineError::Execution(e) => Some(e),
            EngineError::Portfolio(e) => Some(e),
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        EngineError::Config(e)
    }
}

impl From<DataError> for EngineError {
    fn from(e: DataError) -> Self {
        EngineError::Data(e)
    }
}

impl From<StrategyContractError> for EngineError {
    fn from(e: StrategyContractError) -> Self {
        EngineError::StrategyContract(e)
    }
}

impl From<PortfolioError> for EngineError {
    fn from(e: PortfolioError) -> Self {
        EngineError::Portfolio(e)
    }
}

impl From<ExecutionError> for EngineError {
    fn from(e: ExecutionError) -> Self {
        EngineError::Execution(e)
    }
}
