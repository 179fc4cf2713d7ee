//! Read-only library listing commands.

use tokio::runtime::Runtime;

use super::{open_library, print_json};
use crate::config::Config;
use crate::model::Song;

/// List all artists
pub fn cmd_artists(rt: &Runtime, config: &Config, json: bool) -> anyhow::Result<()> {
    rt.block_on(async {
        let library = open_library(config).await?;
        let artists = library.get_all_artists().await?;
        if json {
            print_json(&artists)?;
        } else {
            for artist in artists {
                println!("{artist}");
            }
        }
        library.close().await;
        Ok(())
    })
}

/// List albums, optionally by one artist
pub fn cmd_albums(
    rt: &Runtime,
    config: &Config,
    artist: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let library = open_library(config).await?;
        let albums = match artist {
            Some(artist) => library.get_albums_by_artist(artist).await?,
            None => library.get_all_albums().await?,
        };
        if json {
            print_json(&albums)?;
        } else {
            for album in albums {
                let art = album.art_manual.as_ref().or(album.art_automatic.as_ref());
                match art {
                    Some(art) => println!("{} - {}  [{}]", album.artist, album.album_name, art),
                    None => println!("{} - {}", album.artist, album.album_name),
                }
            }
        }
        library.close().await;
        Ok(())
    })
}

/// List the songs of one album
pub fn cmd_songs(
    rt: &Runtime,
    config: &Config,
    artist: &str,
    album: &str,
    json: bool,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let library = open_library(config).await?;
        let songs = library.get_songs(artist, album).await?;
        if json {
            print_json(&songs)?;
        } else {
            for song in &songs {
                println!("{}", song_line(song));
            }
        }
        library.close().await;
        Ok(())
    })
}

/// Show one song
pub fn cmd_song(rt: &Runtime, config: &Config, id: i64, json: bool) -> anyhow::Result<()> {
    rt.block_on(async {
        let library = open_library(config).await?;
        let Some(song) = library.get_song_by_id(id).await? else {
            anyhow::bail!("No song with id {id}");
        };
        if json {
            print_json(&song)?;
        } else {
            println!("{}", song_line(&song));
            println!("  artist:  {}", song.artist);
            println!("  album:   {}", song.album);
            if !song.genre.is_empty() {
                println!("  genre:   {}", song.genre);
            }
            if let Some(year) = song.year {
                println!("  year:    {year}");
            }
            if let Some(art) = song.art_manual.as_ref().or(song.art_automatic.as_ref()) {
                println!("  art:     {art}");
            }
        }
        library.close().await;
        Ok(())
    })
}

fn song_line(song: &Song) -> String {
    let track = song.track.map(|t| format!("{t:02}. ")).unwrap_or_default();
    let title = if song.title.is_empty() {
        song.filename.as_deref().unwrap_or("?")
    } else {
        &song.title
    };
    let length = song
        .length
        .map(|secs| format!(" ({}:{:02})", secs / 60, secs % 60))
        .unwrap_or_default();
    format!("#{:<5} {track}{title}{length}", song.id.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_line_prefers_title() {
        let song = Song {
            id: Some(3),
            filename: Some("a.mp3".into()),
            title: "Intro".into(),
            track: Some(1),
            length: Some(125),
            ..Default::default()
        };
        assert_eq!(song_line(&song), "#3     01. Intro (2:05)");
    }

    #[test]
    fn test_song_line_falls_back_to_filename() {
        let song = Song {
            id: Some(12),
            filename: Some("disc1/untitled.flac".into()),
            ..Default::default()
        };
        assert_eq!(song_line(&song), "#12    disc1/untitled.flac");
    }
}
