use colored::*;

/// 控制台状态行的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Info,
    Warning,
    Error,
}

impl Status {
    fn marker(self) -> ColoredString {
        match self {
            Status::Success => "✓".green().bold(),
            Status::Info => "ℹ".blue().bold(),
            Status::Warning => "⚠".yellow().bold(),
            Status::Error => "✗".red().bold(),
        }
    }
}

/// 面向用户的终端输出，诊断日志仍然走 tracing
pub struct PrettyLogger;

impl PrettyLogger {
    pub fn status(status: Status, message: impl AsRef<str>) {
        println!("{} {}", status.marker(), message.as_ref());
    }

    /// 流程中的一个阶段，例如“解析”“下载”“打包”
    pub fn step_start(step: impl AsRef<str>) {
        println!("\n{} {}", "▶".cyan().bold(), step.as_ref().bold());
    }

    pub fn file_info(label: impl AsRef<str>, path: impl AsRef<str>) {
        println!("{} {}: {}", "📁".blue().bold(), label.as_ref().bold(), path.as_ref());
    }

    pub fn separator() {
        println!("{}", "─".repeat(50).bright_black());
    }

    /// 一批下载结束后的统计，有失败时失败数标红
    pub fn batch_summary(attempted: usize, succeeded: usize, failed: usize) {
        let succeeded = format!("成功 {}", succeeded).green().bold();
        let failed = match failed {
            0 => "失败 0".bright_black(),
            n => format!("失败 {}", n).red().bold(),
        };
        println!("{} 共 {} 个, {}, {}", "📦".magenta().bold(), attempted, succeeded, failed);
    }
}

#[macro_export]
macro_rules! log_success {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::status(
            $crate::common::logger::Status::Success,
            format!($($arg)*),
        )
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::status(
            $crate::common::logger::Status::Info,
            format!($($arg)*),
        )
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::status(
            $crate::common::logger::Status::Warning,
            format!($($arg)*),
        )
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::status(
            $crate::common::logger::Status::Error,
            format!($($arg)*),
        )
    };
}

#[macro_export]
macro_rules! log_step {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::step_start(format!($($arg)*))
    };
}
