//! The slash command catalogue.

use ikabot_core::Feature;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Now,
    Next,
    AllNext,
    Salmon,
    AllSalmon,
    TeamContest,
    Event,
    AllEvent,
    Fest,
    AllFest,
    Gear,
    MonthlyGear,
    XRank,
    Help,
    /// Route a feature's notifications to the invoking channel
    NotifyHere(Feature),
}

impl BotCommand {
    /// Commands that show data, in help order.
    pub const DISPLAY: [BotCommand; 14] = [
        BotCommand::Now,
        BotCommand::Next,
        BotCommand::AllNext,
        BotCommand::Salmon,
        BotCommand::AllSalmon,
        BotCommand::TeamContest,
        BotCommand::Event,
        BotCommand::AllEvent,
        BotCommand::Fest,
        BotCommand::AllFest,
        BotCommand::Gear,
        BotCommand::MonthlyGear,
        BotCommand::XRank,
        BotCommand::Help,
    ];

    pub fn all() -> impl Iterator<Item = BotCommand> {
        Self::DISPLAY
            .into_iter()
            .chain(Feature::ALL.into_iter().map(BotCommand::NotifyHere))
    }

    pub fn name(self) -> &'static str {
        match self {
            BotCommand::Now => "now",
            BotCommand::Next => "next",
            BotCommand::AllNext => "all-next",
            BotCommand::Salmon => "salmon",
            BotCommand::AllSalmon => "all-salmon",
            BotCommand::TeamContest => "team_contest",
            BotCommand::Event => "event",
            BotCommand::AllEvent => "all-event",
            BotCommand::Fest => "fest",
            BotCommand::AllFest => "all-fest",
            BotCommand::Gear => "gear",
            BotCommand::MonthlyGear => "monthly_gear",
            BotCommand::XRank => "xrank",
            BotCommand::Help => "help",
            BotCommand::NotifyHere(feature) => feature.notify_here_command(),
        }
    }

    pub fn description(self) -> String {
        let text = match self {
            BotCommand::Now => "現在のステージを表示します",
            BotCommand::Next => "次のステージを表示します",
            BotCommand::AllNext => "取得できる全ての時間帯のステージを表示します",
            BotCommand::Salmon => "現在のサーモンランを表示します",
            BotCommand::AllSalmon => "取得できる全ての時間帯のサーモンランを表示します",
            BotCommand::TeamContest => "バイトチームコンテストを表示します",
            BotCommand::Event => "イベントマッチを表示します",
            BotCommand::AllEvent => "取得できる全ての時間帯のイベントマッチを表示します",
            BotCommand::Fest => "フェス情報を表示します",
            BotCommand::AllFest => "取得できる全てのフェス情報を表示します",
            BotCommand::Gear => "ゲソタウンのギア更新情報を表示します",
            BotCommand::MonthlyGear => "サーモンランの月替わりギアを表示します",
            BotCommand::XRank => "Xランキング（タカオカ）のトップ100を表示します",
            BotCommand::Help => "コマンド一覧を表示します",
            BotCommand::NotifyHere(feature) => {
                return format!(
                    "{}自動通知の送信先をこのチャンネルに設定します",
                    feature.label()
                );
            }
        };
        text.to_string()
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::all().find(|command| command.name() == name)
    }

    /// Text commands accepted in plain messages.
    pub fn parse_text(content: &str) -> Option<Self> {
        match content.trim() {
            "/now" => Some(BotCommand::Now),
            "/next" => Some(BotCommand::Next),
            _ => None,
        }
    }
}
