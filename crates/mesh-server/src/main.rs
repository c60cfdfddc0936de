//! Точка входа брокера регистрации узлов mesh-сети.

use clap::Parser;
use mesh_server::config::{hash_password, ServerConfig, TlsMode};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mesh-server",
    about = "Брокер регистрации и туннельных портов узлов mesh-сети"
)]
struct Cli {
    /// Адрес для прослушивания (host:port)
    #[arg(long, default_value = "0.0.0.0:8000")]
    listen: String,

    /// URL базы данных
    #[arg(
        long,
        default_value = "sqlite:./mesh.db?mode=rwc",
        env = "DATABASE_URL"
    )]
    db_url: String,

    /// Режим TLS: none, self-signed, cert
    #[arg(long, default_value = "none")]
    tls_mode: String,

    /// Домен для SAN самоподписанного сертификата
    #[arg(long, default_value = "mesh.example.org")]
    domain: String,

    /// Путь к PEM-сертификату (режим cert)
    #[arg(long, default_value = "/etc/mesh/cert.pem")]
    tls_cert: String,

    /// Путь к PEM-ключу (режим cert)
    #[arg(long, default_value = "/etc/mesh/key.pem")]
    tls_key: String,

    /// Секрет JWT (случайный если не задан)
    #[arg(long, env = "JWT_SECRET")]
    jwt_secret: Option<String>,

    /// Имя пользователя администратора
    #[arg(long, default_value = "admin")]
    admin_username: String,

    /// Пароль администратора
    #[arg(long, env = "ADMIN_PASSWORD")]
    admin_password: Option<String>,

    /// Общий API-ключ устройств (заголовок MESH-APIKEY)
    #[arg(long, env = "MESH_API_KEY")]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Инициализация логгера
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Разбор режима TLS
    let tls_mode: TlsMode = cli
        .tls_mode
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    // JWT secret: из аргумента или генерируем случайный
    let jwt_secret = cli.jwt_secret.unwrap_or_else(|| {
        let mut buf = [0u8; 32];
        getrandom::fill(&mut buf).expect("Ошибка генерации JWT secret");
        hex::encode(buf)
    });

    // Хэш пароля администратора
    let admin_password = cli.admin_password.unwrap_or_else(|| {
        tracing::warn!("Пароль администратора не задан, используется 'admin' (небезопасно!)");
        "admin".to_string()
    });
    let admin_password_hash = hash_password(&admin_password);

    // API-ключ устройств: без него регистрация и checkin невозможны
    let api_key = cli.api_key.unwrap_or_else(|| {
        let mut buf = [0u8; 16];
        getrandom::fill(&mut buf).expect("Ошибка генерации API-ключа");
        let key = hex::encode(buf);
        tracing::warn!("API-ключ устройств не задан, сгенерирован: {key}");
        key
    });

    let config = ServerConfig {
        listen: cli.listen,
        db_url: cli.db_url,
        tls_mode,
        domain: cli.domain,
        tls_cert: cli.tls_cert,
        tls_key: cli.tls_key,
        jwt_secret,
        admin_username: cli.admin_username,
        admin_password_hash,
        api_key,
    };

    mesh_server::run(config).await
}
