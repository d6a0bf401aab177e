use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// 编号图片 / EPUB 下载打包工具
#[derive(Parser, Debug)]
#[command(name = "ebookdl")]
#[command(version = "1.0")]
#[command(author = "rpeng252@gmail.com")]
#[command(about = "下载连续编号的图片或 EPUB 内容包，并打包成一个压缩文件", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// JSON 配置文件，命令行参数会覆盖其中的值
    #[arg(long, value_name = "FILE", global = true)]
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// 最大并发下载数
    #[arg(long, value_name = "N", global = true)]
    pub concurrency: Option<usize>,

    /// 打包后保留下载目录
    #[arg(long, global = true)]
    pub keep: bool,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 下载连续编号的图片并打包为 cbz
    Images(ImagesArgs),
    /// 根据 OPF 清单下载 EPUB 内容并打包
    Epub(EpubArgs),
}

#[derive(Args, Debug)]
pub struct ImagesArgs {
    /// 带一个占位符的图片地址，例如 https://x/img{:03}.png
    #[arg(long, value_name = "TEMPLATE")]
    #[arg(value_hint = clap::ValueHint::Url)]
    pub url: String,

    /// 下载目录，同时决定打包文件名
    #[arg(long, value_name = "DIR", default_value = "out")]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub output_dir: PathBuf,

    /// 起始编号
    #[arg(long, default_value_t = 1)]
    pub start: u64,

    /// 结束编号（包含），不指定时自动探测
    #[arg(long)]
    pub stop: Option<u64>,

    /// 本地文件名格式
    #[arg(long, value_name = "FORMAT")]
    pub name_format: Option<String>,

    /// 打包扩展名
    #[arg(long, value_name = "EXT")]
    pub archive_ext: Option<String>,
}

#[derive(Args, Debug)]
pub struct EpubArgs {
    /// OPF 清单地址，例如 https://x/book/OEBPS/content.opf
    #[arg(long, value_name = "URL")]
    #[arg(value_hint = clap::ValueHint::Url)]
    pub url: String,

    /// 书籍目录建在这个目录下
    #[arg(long, value_name = "DIR", default_value = ".")]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub output_dir: PathBuf,

    /// 指定书名，不使用清单中的标题
    #[arg(long)]
    pub title: Option<String>,
}
