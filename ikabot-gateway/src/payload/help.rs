//! The command list.

use ikabot_core::Feature;

use super::{EmbedSpec, Payload};
use crate::commands::BotCommand;

const HELP_COLOR: u32 = 0x6C8EBF;

fn slash_lines(commands: impl Iterator<Item = BotCommand>) -> String {
    commands
        .map(|command| format!("/{}", command.name()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build() -> Payload {
    let display = BotCommand::DISPLAY
        .into_iter()
        .filter(|command| *command != BotCommand::Help);
    let notify = Feature::ALL.into_iter().map(BotCommand::NotifyHere);

    let embed = EmbedSpec::new("コマンド一覧", HELP_COLOR)
        .field("表示", slash_lines(display), false)
        .field("通知チャンネル設定", slash_lines(notify), false)
        .field("通知テスト", "なし", false);
    Payload {
        embeds: vec![embed],
        attachments: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_lists_commands() {
        let payload = build();
        let embed = &payload.embeds[0];
        let display = embed.field_value("表示").unwrap();
        assert!(display.starts_with("/now\n/next\n/all-next"));
        assert!(display.ends_with("/xrank"));
        assert!(!display.contains("/help"));

        let notify = embed.field_value("通知チャンネル設定").unwrap();
        assert_eq!(notify.lines().count(), 8);
        assert!(notify.starts_with("/notify_here\n"));
        assert_eq!(embed.field_value("通知テスト"), Some("なし"));
    }
}
