/*!

This is the long-form manual for `social_choice` and `choicetab`.

## Ballots

A voter may express itself in several ways. All of them are [`crate::Ballot`]s:

* `Order`: a weak order over some candidates, written `a > b ~ c > d` (`>` separates
  the classes, `~` the tied candidates of a class). Candidates that the voter could rank
  but did not are _unordered_.
* `Levels`: a grade for some candidates, on a [`crate::Scale`]. Candidates that the voter
  could grade but did not are _ungraded_.
* `OneName`, `Plurality`, `Veto`: a single name, or an abstention.

In all cases the ballot knows its candidates: the ones that were available to the voter.
The other candidates of the election are _absent_ from the ballot.

Raw input is read by the general converter: a text is parsed as an order (an order of
one name is a single name, a text that is not an order is read as a name), a map is read
as grades with a guessed scale (all integers: a range, all numbers: an interval, anything
else: a set of labels).

## Scales

| scale      | levels                                 | bounded |
|------------|----------------------------------------|---------|
| `interval` | floats between `low` and `high`        | yes     |
| `range`    | integers between `low` and `high`      | yes     |
| `fromList` | labels, from the worst to the best     | if not empty |
| `fromSet`  | values in their natural order          | if not empty |
| `natural`  | anything, in the natural order         | no      |

Converting grades from one scale to another is an affine map between the bounds of the
two scales, rounded to the nearest level of the target. Labels use their rank. Rankings
are converted with their Borda points, so that the first candidate gets the top of the
scale and the last one the bottom.

## Rules

| rule                | ballots as      | score |
|---------------------|-----------------|-------|
| `plurality`         | first name      | one point per ballot |
| `veto`              | last name       | minus one point per ballot |
| `borda`             | ranking         | Borda points (candidates beaten, ties share) |
| `bucklin`           | ranking         | one point for each of the `k` best candidates |
| `rangeVoting`       | grades          | average grade |
| `majorityJudgment`  | grades          | median grade, then the share of better and worse grades |
| `condorcet`         | ranking         | the candidate that beats all the others in a duel wins |
| `simplifiedDodgson` | ranking         | sum of the lost duels, weighted by their margin |
| `black`             | ranking         | `condorcet`, then `borda` |
| `kimRoush`          | last name       | eliminates the candidates with a veto score below average |
| `irv`               | first name      | eliminates the plurality loser |
| `nanson`            | ranking         | eliminates the candidates with a Borda score below average |

All the rules produce a weak order over the candidates. The winner is taken from the
first class and the trailer from the last one, with the tie-break:

* `unambiguous` (default): ties are not broken. Asking for the winner of a tie fails.
* `ascending` (or `useCandidateOrder`): alphabetical order of the names.
* `descending`: reverse alphabetical order.
* `random`: an order that depends on a seed (`randomSeed`) and on the names only.

For elimination rules, the tie-break is also used for the rounds.

Rules that read the first or the last name of a ranking (`plurality`, `veto`, `kimRoush`,
`irv`) fail when that name is tied on a ballot, for instance `a ~ b > c` for `plurality`.

## Input formats

The following formats are supported:
* `csv` Comma Separated Values, one ranking per row
* `csv_levels` Comma Separated Values, one candidate per column and one grade per cell
* `json` A list of ballots, in the same format as in the configuration file

### csv

Each column (in order) is a rank. The name of the rank in the header is not significant.
Tied candidates share a cell, separated by `~` (see `tieDelimiter`). A blank cell is a
skipped rank, a candidate ranked twice keeps its first rank.

```text
id,count,choice 1,choice 2,choice 3
id1,20,A,B ~ C,
id2,20,A,C,B
```

The `id` and `count` columns are optional. Headers in the first row are optional.
See the [Configuration section](#configuration) on controling the optional rows and columns.

### csv_levels

The first row holds the names of the candidates. This format is also created by
Qualtrics polls. The file is expected to look as follows:

```text
id,A,B,C
id1,Good,Poor,
id2,Excellent,Good,Poor
```

The cells are integers, numbers or labels. An empty cell leaves the candidate ungraded.
With a `scale` in the rule, all the grades must belong to it.

## Configuration

`choicetab` comes with sensible defaults (plurality, no tie-break). An election is
described by a JSON file:

```text
{
  "outputSettings": { "contestName": "Board" },
  "rule": {
    "name": "majorityJudgment",
    "tiebreakMode": "random",
    "randomSeed": 12,
    "scale": { "type": "fromList", "levels": ["Poor", "Good", "Excellent"] }
  },
  "candidates": ["A", "B", "C"],
  "ballots": [
    { "ballot": "A > B ~ C", "weight": 2.0, "voter": "Anna" },
    { "ballot": { "A": "Good", "B": "Poor" } },
    { "ballot": "C", "kind": "veto", "candidates": ["A", "C"] }
  ],
  "source": { "provider": "csv", "filePath": "votes.csv", "firstVoteRowIndex": 2 }
}
```

`rule`:
 - `name` (string, default `plurality`): one of the rules above.
 - `tiebreakMode` and `randomSeed`: the tie-break.
 - `scale` (optional): the scale of the grades, for `rangeVoting` and `majorityJudgment`.
 - `k` (number, default 1): for `bucklin`.
 - `bordaUnorderedGivePoints` (boolean, default true): when rankings are converted to
   grades, whether the unordered candidates count as beaten by the ranked ones.

`candidates` (optional): the candidates of the election. By default, all the candidates
that appear in the ballots.

`ballots` (optional): each ballot is a text, a list of classes (`[["A"], ["B", "C"]]`)
or a map of grades, with an optional `kind` (`order`, `levels`, `oneName`, `plurality`,
`veto`), `weight` (default 1), `voter` and `candidates` available to the voter.

`source` (optional): a file with more ballots.
 - `provider`: `csv`, `csv_levels` or `json`.
 - `filePath`: relative to the configuration file.
 - `firstVoteColumnIndex`, `firstVoteRowIndex` (string or number, default 1): where the
   votes start. Indices start at 1, columns may also be letters as in spreadsheets.
 - `idColumnIndex`, `countColumnIndex` (string or number, optional): the columns of the
   voter ids and of the counts. If not provided, every vote will be assigned a count of 1.
 - `tieDelimiter` (string, default `~`).

The command line options `--input`, `--input-type`, `--rule`, `--tiebreak` and
`--random-seed` override the configuration file.

## Output

The summary is a JSON object with the keys `config`, `candidates`, `order` (the weak order,
best first), `strictOrder`, `winner`, `cowinners`, `trailer`, `scores`, `matrix` (for the
rules based on duels) and `rounds` (for the elimination rules). When a tie cannot be
broken, `strictOrder`, `winner` or `trailer` are `null`.

 */
