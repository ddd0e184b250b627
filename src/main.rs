use clap::Parser;

use lsb_spa::{
    cli::{Cli, Commands},
    handler::{handle_analyze, handle_hide, handle_recover, handle_sanitize, handle_sweep},
};

/// 程序的主入口点
///
/// 负责初始化日志、解析命令行参数，并根据子命令将执行分派到相应的处理函数
fn main() -> anyhow::Result<()> {
    // 日志级别由 RUST_LOG 控制
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Hide(args) => handle_hide(args),
        Commands::Recover(args) => handle_recover(args),
        Commands::Analyze(args) => handle_analyze(args).map(|_| ()),
        Commands::Sanitize(args) => handle_sanitize(args),
        Commands::Sweep(args) => handle_sweep(args).map(|_| ()),
    }
}
