//! 설정 관리 — tradespec.toml 파싱 및 런타임 설정
//!
//! [`TradespecConfig`]는 엔드포인트, 이벤트 버스, 폴링, 기대값 설정을 담는
//! 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`QUOTE_URL`, `AUDIT_URL`, `DASHBOARD_URL`,
//!    `TRADESPEC_POLLING_MAX_ATTEMPTS=30` 형식)
//! 3. 설정 파일 (`tradespec.toml`, 선택)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), tradespec_core::error::TradespecError> {
//! use tradespec_core::config::TradespecConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = TradespecConfig::load("tradespec.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = TradespecConfig::parse("[polling]\nmax_attempts = 10")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::error::{ConfigError, TradespecError};

/// 엔드포인트 기본값 (환경변수가 없을 때)
pub const DEFAULT_QUOTE_URL: &str = "http://localhost:35000/";
/// 감사(audit) 서비스 기본 URL
pub const DEFAULT_AUDIT_URL: &str = "http://localhost:33000/";
/// 대시보드 기본 URL
pub const DEFAULT_DASHBOARD_URL: &str = "http://localhost:8000/";

/// tradespec 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradespecConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 대상 시스템 엔드포인트
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    /// 이벤트 버스 설정
    #[serde(default)]
    pub bus: BusConfig,
    /// 폴링 설정
    #[serde(default)]
    pub polling: PollingConfig,
    /// HTTP 설정
    #[serde(default)]
    pub http: HttpConfig,
    /// 시나리오 기대값
    #[serde(default)]
    pub expectations: ExpectationsConfig,
}

impl TradespecConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TradespecError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 있으면 로드하고, 없으면 기본값에 환경변수 오버라이드만 적용합니다.
    ///
    /// 설정 파일은 선택 사항이므로 CLI의 기본 경로에 파일이 없어도 실행할 수 있습니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, TradespecError> {
        let path = path.as_ref();
        match Self::load(path).await {
            Err(TradespecError::Config(ConfigError::FileNotFound { .. })) => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, TradespecError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TradespecError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                TradespecError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, TradespecError> {
        toml::from_str(toml_str).map_err(|e| {
            TradespecError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 엔드포인트는 `QUOTE_URL`, `AUDIT_URL`, `DASHBOARD_URL`을 그대로 사용하고,
    /// 나머지는 `TRADESPEC_{SECTION}_{FIELD}` 규칙을 따릅니다.
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "TRADESPEC_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "TRADESPEC_GENERAL_LOG_FORMAT");

        // Endpoints
        override_string(&mut self.endpoints.quote_url, "QUOTE_URL");
        override_string(&mut self.endpoints.audit_url, "AUDIT_URL");
        override_string(&mut self.endpoints.dashboard_url, "DASHBOARD_URL");
        if let Ok(url) = std::env::var("TRADESPEC_ENDPOINTS_BUS_URL") {
            self.endpoints.bus_url = Some(url);
        }

        // Bus
        override_u64(
            &mut self.bus.open_timeout_secs,
            "TRADESPEC_BUS_OPEN_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.bus.request_timeout_secs,
            "TRADESPEC_BUS_REQUEST_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.bus.ping_interval_secs,
            "TRADESPEC_BUS_PING_INTERVAL_SECS",
        );
        override_usize(
            &mut self.bus.channel_capacity,
            "TRADESPEC_BUS_CHANNEL_CAPACITY",
        );

        // Polling
        override_u64(&mut self.polling.interval_ms, "TRADESPEC_POLLING_INTERVAL_MS");
        override_u32(
            &mut self.polling.max_attempts,
            "TRADESPEC_POLLING_MAX_ATTEMPTS",
        );

        // HTTP
        override_u64(&mut self.http.timeout_secs, "TRADESPEC_HTTP_TIMEOUT_SECS");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), TradespecError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        for (field, value) in [
            ("endpoints.quote_url", &self.endpoints.quote_url),
            ("endpoints.audit_url", &self.endpoints.audit_url),
            ("endpoints.dashboard_url", &self.endpoints.dashboard_url),
        ] {
            parse_http_url(field, value)?;
        }
        if let Some(ref url) = self.endpoints.bus_url {
            parse_http_url("endpoints.bus_url", url)?;
        }

        for (field, value) in [
            ("bus.open_timeout_secs", self.bus.open_timeout_secs),
            ("bus.request_timeout_secs", self.bus.request_timeout_secs),
            ("bus.ping_interval_secs", self.bus.ping_interval_secs),
            ("polling.interval_ms", self.polling.interval_ms),
            ("http.timeout_secs", self.http.timeout_secs),
        ] {
            if value == 0 {
                return Err(invalid(field, "must be greater than 0"));
            }
        }

        if self.bus.channel_capacity == 0 {
            return Err(invalid("bus.channel_capacity", "must be greater than 0"));
        }

        if self.polling.max_attempts == 0 {
            return Err(invalid("polling.max_attempts", "must be greater than 0"));
        }

        for (field, value) in [
            ("bus.market_address", &self.bus.market_address),
            ("bus.portfolio_address", &self.bus.portfolio_address),
            ("bus.portfolio_service", &self.bus.portfolio_service),
        ] {
            if value.is_empty() {
                return Err(invalid(field, "address must not be empty"));
            }
        }

        Ok(())
    }
}

// Default는 derive 매크로로 자동 생성 (각 필드가 Default를 구현하므로)

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 대상 시스템 엔드포인트
///
/// 이벤트 버스, 서비스 디스커버리, 운영 엔드포인트는 대시보드 URL에서 파생됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// 시세(quote) 서비스 REST 엔드포인트
    pub quote_url: String,
    /// 감사(audit) 서비스 REST 엔드포인트
    pub audit_url: String,
    /// 대시보드 루트
    pub dashboard_url: String,
    /// 이벤트 버스 브리지 URL. 없으면 `<dashboard>/eventbus/`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bus_url: Option<String>,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            quote_url: DEFAULT_QUOTE_URL.to_owned(),
            audit_url: DEFAULT_AUDIT_URL.to_owned(),
            dashboard_url: DEFAULT_DASHBOARD_URL.to_owned(),
            bus_url: None,
        }
    }
}

impl EndpointsConfig {
    /// SockJS 이벤트 버스 브리지 URL (`bus_url` 또는 `<dashboard>/eventbus/`)
    pub fn eventbus_url(&self) -> Result<Url, ConfigError> {
        match self.bus_url {
            Some(ref url) => parse_http_url("endpoints.bus_url", url).map_err(|_| {
                ConfigError::InvalidValue {
                    field: "endpoints.bus_url".to_owned(),
                    reason: format!("not a valid http(s) url: {url}"),
                }
            }),
            None => self.dashboard_child("eventbus/"),
        }
    }

    /// 서비스 디스커버리 URL (`<dashboard>/discovery/`)
    pub fn discovery_url(&self) -> Result<Url, ConfigError> {
        self.dashboard_child("discovery/")
    }

    /// 최근 거래 운영 URL (`<dashboard>/operations/`)
    pub fn operations_url(&self) -> Result<Url, ConfigError> {
        self.dashboard_child("operations/")
    }

    fn dashboard_child(&self, child: &str) -> Result<Url, ConfigError> {
        let base = parse_http_url("endpoints.dashboard_url", &self.dashboard_url)
            .map_err(|_| ConfigError::InvalidValue {
                field: "endpoints.dashboard_url".to_owned(),
                reason: format!("not a valid http(s) url: {}", self.dashboard_url),
            })?;
        let base = with_trailing_slash(base);
        base.join(child).map_err(|e| ConfigError::InvalidValue {
            field: "endpoints.dashboard_url".to_owned(),
            reason: e.to_string(),
        })
    }
}

/// 이벤트 버스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// 연결 ready 신호 대기 상한 (초)
    pub open_timeout_secs: u64,
    /// 요청/응답 대기 상한 (초)
    pub request_timeout_secs: u64,
    /// 브리지 ping 프레임 전송 주기 (초)
    pub ping_interval_secs: u64,
    /// 구독별 전달 채널 용량
    pub channel_capacity: usize,
    /// 시세 브로드캐스트 채널
    pub market_address: String,
    /// 거래 브로드캐스트 채널
    pub portfolio_address: String,
    /// 포트폴리오 서비스 주소
    pub portfolio_service: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            open_timeout_secs: 10,
            request_timeout_secs: 10,
            ping_interval_secs: 5,
            channel_capacity: 1024,
            market_address: "market".to_owned(),
            portfolio_address: "portfolio".to_owned(),
            portfolio_service: "service.portfolio".to_owned(),
        }
    }
}

impl BusConfig {
    /// 연결 대기 상한
    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }

    /// 요청 대기 상한
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// ping 주기
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }
}

/// 폴링 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// 평가 간격 (밀리초)
    pub interval_ms: u64,
    /// 최대 평가 횟수
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            max_attempts: 60,
        }
    }
}

impl PollingConfig {
    /// 평가 간격
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// HTTP 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl HttpConfig {
    /// 요청 타임아웃
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 시나리오 기대값
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectationsConfig {
    /// 시세 서비스 응답에 반드시 있어야 하는 종목
    pub companies: Vec<String>,
    /// 시장 이벤트 시나리오에서 최소로 수집해야 하는 시세 수
    pub min_quotes: usize,
    /// 포트폴리오 시나리오에서 최소로 수집해야 하는 거래 수
    pub min_trades: usize,
    /// 감사 엔드포인트가 반환할 수 있는 최대 거래 수
    pub max_audit_trades: usize,
    /// 서비스 디스커버리 레코드 수
    pub discovery_records: usize,
}

impl Default for ExpectationsConfig {
    fn default() -> Self {
        Self {
            companies: vec![
                "MacroHard".to_owned(),
                "Black Coat".to_owned(),
                "Divinator".to_owned(),
            ],
            min_quotes: 4,
            min_trades: 1,
            max_audit_trades: 10,
            discovery_records: 5,
        }
    }
}

// --- URL 헬퍼 ---

fn parse_http_url(field: &str, value: &str) -> Result<Url, TradespecError> {
    let url = Url::parse(value).map_err(|e| invalid(field, format!("invalid url '{value}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(
            field,
            format!("unsupported scheme '{other}', expected http or https"),
        )),
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn invalid(field: &str, reason: impl Into<String>) -> TradespecError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
