//! gpt-translate 命令行入口

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use gpt_translate::env::{self, EnvVar};
use gpt_translate::gateway::{
    CompletionClient, GatewayService, HttpChannel, LocalChannel, MessageChannel,
};
use gpt_translate::parsers::html::{html_to_dom, serialize_document};
use gpt_translate::translation::{
    PageTranslator, Settings, SettingsStore, TranslationError, TranslationResult,
    TranslatorConfig,
};

const SETTINGS_SAVED: &str = "設定已儲存。下次翻譯將使用最新設定。";

#[derive(Parser, Debug)]
#[command(name = "gpt-translate", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 翻译 HTML 文档，把译文插入到每个文本块之后
    Translate(TranslateArgs),

    /// 查看或修改设置
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// 列出支持的环境变量
    Env,
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// 输入文件，`-` 表示标准输入
    input: String,

    /// 输出文件，缺省时写到标准输出
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 文档编码
    #[arg(short, long, default_value = "utf-8")]
    encoding: String,

    /// 外部网关地址，缺省时使用进程内网关
    #[arg(long)]
    gateway: Option<String>,

    /// 每个翻译块的字符预算 (1-1000000)
    #[arg(long, value_parser = parse_chunk_size)]
    chunk_size: Option<usize>,

    /// 本次运行使用的模型，不写入设置
    #[arg(short, long)]
    model: Option<String>,
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    /// 显示当前设置（API Key 已遮蔽）
    Show,

    /// 保存设置
    Set {
        /// OpenAI API Key
        #[arg(long)]
        api_key: String,

        /// 模型，缺省时保留原有设置
        #[arg(long)]
        model: Option<String>,

        /// 翻译提示词，缺省时保留原有设置
        #[arg(long)]
        prompt: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let code = match cli.command {
        Command::Translate(args) => run_translate(args).await,
        Command::Settings { action } => run_settings(action),
        Command::Env => {
            print!("{}", env::generate_env_docs());
            0
        }
    };
    process::exit(code);
}

fn parse_chunk_size(value: &str) -> Result<usize, env::EnvError> {
    env::translation::ChunkSize::parse(value)
}

fn init_logging() {
    let level = env::core::LogLevel::get()
        .ok()
        .and_then(|level| level.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run_translate(args: TranslateArgs) -> i32 {
    let mut config = match TranslatorConfig::from_env() {
        Ok(config) => config,
        Err(e) => return report_error(&e),
    };
    if let Some(gateway) = args.gateway.clone() {
        config.gateway_url = Some(gateway);
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_budget = chunk_size;
    }
    if let Err(e) = config.validate() {
        return report_error(&e);
    }

    let input = match read_input(&args.input) {
        Ok(input) => input,
        Err(e) => return report_error(&e),
    };
    let dom = match html_to_dom(&input, &args.encoding) {
        Ok(dom) => dom,
        Err(e) => return report_error(&TranslationError::from(e)),
    };

    let channel = match open_channel(&config) {
        Ok(channel) => channel,
        Err(e) => return report_error(&e),
    };

    // 设置在运行开始时读取，读取失败属于运行前错误
    let mut translator =
        PageTranslator::new(SettingsStore::open_default(), config.chunk_budget, channel);
    if let Some(model) = args.model {
        translator = translator.with_model(model);
    }
    let (report, failure) = match translator.translate_document(&dom).await {
        Ok(report) => (report, None),
        Err(failure) if failure.is_preflight() => return report_error(&failure.error),
        Err(failure) => (failure.report, Some(failure.error)),
    };

    let written = serialize_document(&dom, &args.encoding)
        .map_err(TranslationError::from)
        .and_then(|html| write_output(args.output.as_ref(), &html));
    if let Err(e) = written {
        return report_error(&e);
    }

    tracing::info!(
        "已完成 {}/{} 个翻译块，写入 {} 段译文",
        report.chunks_completed,
        report.chunks_total,
        report.blocks_translated
    );

    match failure {
        Some(error) => report_error(&error),
        None => 0,
    }
}

fn run_settings(action: SettingsAction) -> i32 {
    let store = SettingsStore::open_default();

    match action {
        SettingsAction::Show => match store.load() {
            Ok(settings) => {
                println!("設定檔: {}", store.path().display());
                println!("API Key: {}", settings.masked_api_key());
                println!("模型: {}", settings.model);
                println!("提示詞: {}", settings.user_prompt);
                0
            }
            Err(e) => report_error(&e),
        },
        SettingsAction::Set {
            api_key,
            model,
            prompt,
        } => {
            let current = match Settings::load_from_file(store.path()) {
                Ok(settings) => settings,
                Err(e) => return report_error(&e),
            };
            let model = model.unwrap_or(current.model);
            let prompt = prompt.unwrap_or(current.user_prompt);

            let saved = Settings::from_form(&api_key, Some(&model), Some(&prompt))
                .and_then(|settings| store.save(&settings));
            match saved {
                Ok(()) => {
                    println!("{}", SETTINGS_SAVED);
                    0
                }
                Err(e) => report_error(&e),
            }
        }
    }
}

fn open_channel(config: &TranslatorConfig) -> TranslationResult<Arc<dyn MessageChannel>> {
    match config.gateway_url.as_deref() {
        Some(url) => {
            tracing::info!("使用外部网关: {}", url);
            Ok(Arc::new(HttpChannel::new(url)?))
        }
        None => {
            let client = CompletionClient::new(&config.api_url)?;
            Ok(Arc::new(LocalChannel::spawn(GatewayService::new(client))))
        }
    }
}

fn read_input(input: &str) -> TranslationResult<Vec<u8>> {
    let mut data = Vec::new();
    if input == "-" {
        io::stdin()
            .read_to_end(&mut data)
            .map_err(|e| TranslationError::IoError(format!("讀取標準輸入失敗: {}", e)))?;
    } else {
        data = fs::read(input)
            .map_err(|e| TranslationError::IoError(format!("無法讀取 {}: {}", input, e)))?;
    }
    Ok(data)
}

fn write_output(output: Option<&PathBuf>, html: &[u8]) -> TranslationResult<()> {
    match output {
        Some(path) => fs::write(path, html)
            .map_err(|e| TranslationError::IoError(format!("無法寫入 {}: {}", path.display(), e))),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(html)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn report_error(error: &TranslationError) -> i32 {
    eprintln!("{}", error);
    1
}
