/*!

This is the long-form manual for `borda_count` and `bordatally`.

## Scoring

A ballot is a list of songs, most preferred first. Ballots may have different
lengths. A ballot of length `L` gives `L` points to its first song, `L - 1` to
the second one, down to `1` point for the last song. Each ballot is scored on
its own length: a song ranked first on a ballot of two songs earns 2 points,
the same position on a ballot of ten songs earns 10 points.

When two songs have the same score, the song with more first-place votes comes
first. If they have as many first-place votes, second-place votes decide, and
so on. Two songs with exactly the same votes are ordered alphabetically. The
ranking of two songs with the same score carries a note such as:

```text
Tied in score, won due to more 2ⁿᵈ-place votes
Tied in score, lost due to fewer 2ⁿᵈ-place votes
```

Only neighbours in the final ranking are compared for these notes.

## Input formats

The following formats are supported:
* `json` Ballot documents, one per voter
* `csv` Comma Separated Values, one ballot per row
* `xlsx` Excel spreadsheet, one ballot per row

### json

Either an array of documents:

```text
[
  {"user": "ana", "songs": ["Penny Lane", "Something"]},
  {"user": "ben", "songs": ["Something", {"name": "Rain", "artist": "The Beatles"}]}
]
```

or an object keyed by voter:

```text
{
  "ana": {"songs": ["Penny Lane", "Something"]},
  "ben": {"songs": ["Something"]}
}
```

A song is either a title or a record with a `name` and optionally an `artist`
and a `spotifyUrl`. A title and a record are two different songs, even when
they have the same name.

The names of the fields are set with `voterField` (default `user`) and
`entriesField` (default `songs`). A document without a list of songs is
malformed: the tally stops with an error, unless `skipMalformedBallots` is set
in the rules. Documents without a voter get an id built from the file name.

### csv

Each row is a ballot. The cells after the id column are the songs, in order of
preference. Empty cells are skipped.

```text
id,choice 1,choice 2,choice 3
v1,Africa,Bohemian Rhapsody,
v2,Creep,,
```

### xlsx

Same layout as `csv`. Set `excelWorksheetName` (or pass `--excel-worksheet-name`)
when the workbook has more than one worksheet.

## Configuration

```text
{
  "outputSettings": {
    "contestName": "Road trip playlist",
    "outputDirectory": "output",
    "contestDate": "2024-06-01"
  },
  "ballotFileSources": [
    {"provider": "csv", "filePath": "ballots.csv", "idColumnIndex": 1, "firstVoteColumnIndex": 2, "firstVoteRowIndex": 2}
  ],
  "rules": {
    "maxRankingsAllowed": "max",
    "maxBallots": 100,
    "skipMalformedBallots": false
  }
}
```

File paths are relative to the configuration file. Column and row indexes
start at 1, and columns may be given as letters (`A`, `B`, ..., `AB`).

If a voter appears more than once, the last ballot of this voter is counted.

Rules:
- `maxRankingsAllowed` (`"max"` or a number): the tally fails if a ballot
  ranks more songs.
- `maxBallots` (number): the tally fails if more voters sent a ballot.
- `skipMalformedBallots` (boolean, default false): drop malformed documents
  with a warning instead of failing.

## Output

```text
{
  "config": {"contest": "Road trip playlist", "date": "2024-06-01", "ballots": 4, "candidates": 5},
  "rankedSongs": [
    {"song": "Penny Lane", "score": 7, "rankCounts": [1, 2], "tieBreakerInfo": "Tied in score, won due to more 2ⁿᵈ-place votes"}
  ]
}
```

`rankCounts[i]` is the number of ballots that ranked the song at position
`i + 1`, with zeros for positions nobody used.

The summary goes to `outputDirectory/summary.json`, to the file given by
`--out`, or to the standard output. With `--voters-for <title>`, the output is
the list of voters whose ballot contains that song instead.

 */
