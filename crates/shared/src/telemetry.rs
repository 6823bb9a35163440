use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// トレーシングサブスクライバーを初期化
/// `json` が真なら構造化ログ（本番）、偽なら人が読みやすいコンパクト形式で出力します。
/// フィルタは RUST_LOG で上書きでき、未設定時は info です。
pub fn init_tracing(json: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().with_target(false).json()))
        .with((!json).then(|| fmt::layer().compact()))
        .try_init()?;

    Ok(())
}
